//! HTTP surface for health and administration.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → /health/*  → health::report
//!     → /admin/*   → admin::auth → admin::handlers
//!     → response.rs (error → status, Retry-After, JSON body)
//! ```

pub mod response;
pub mod server;

pub use response::{status_for, ErrorBody};
pub use server::{AppState, HttpServer};
