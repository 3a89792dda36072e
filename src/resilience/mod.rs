//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a downstream service:
//!     → guard.rs (one entry point per service)
//!     → circuit_breaker.rs (fail fast while open, track outcomes)
//!     → policies.rs (service-specific retry decisions)
//!     → retries.rs (attempt loop, sleeps from backoff.rs)
//! ```
//!
//! # Design Decisions
//! - Breakers are memoized per service name in registry.rs
//! - Open circuits reject without invoking the operation
//! - Retries only for failures a service reports as transient
//! - Final failures are wrapped with their classification

pub mod backoff;
pub mod circuit_breaker;
pub mod guard;
pub mod policies;
pub mod registry;
pub mod retries;

pub use backoff::{calculate_backoff, Backoff};
pub use circuit_breaker::{
    BreakerError, CircuitBreaker, CircuitBreakerOpenError, CircuitBreakerOptions, CircuitBreakerStats,
    CircuitState,
};
pub use guard::{GuardError, ServiceGuard};
pub use policies::{parse_retry_after, DomainPolicy};
pub use registry::{default_options, CircuitBreakerRegistry, RegistryError};
pub use retries::{retry_with_backoff, with_retry, AttemptDetail, RetryOptions, RetryResult};
