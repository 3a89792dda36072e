//! Resilience layer for outbound integrations.
//!
//! Circuit breakers, retries with backoff and an error taxonomy for the
//! ticketing, task-management, chat and AI services.

pub mod admin;
pub mod config;
pub mod errors;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod services;

pub use config::schema::GuardConfig;
pub use errors::{RemoteError, ServiceError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{CircuitBreaker, CircuitBreakerRegistry, GuardError, ServiceGuard};
pub use services::Service;
