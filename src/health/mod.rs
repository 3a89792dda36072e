//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health, GET /health/circuit-breakers
//!     → registry.get_all_stats() (pure snapshots)
//!     → report.rs (wall-clock timestamps, percent strings)
//!     → JSON
//! ```
//!
//! # Design Decisions
//! - Reading health never changes breaker state
//! - Any open circuit degrades the overall status

pub mod report;

pub use report::{BreakerHealth, HealthReport, HealthStatus};
