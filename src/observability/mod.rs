//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers, retry executor, error reporting produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → /health/circuit-breakers (see health module)
//! ```
//!
//! # Design Decisions
//! - Structured fields (service, state, attempt) on every resilience event
//! - Metrics are cheap facade calls, no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
