//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → breaker defaults and retry presets merged per service
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breakers keep the options they were built with
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BreakerConfig, GuardConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RetryConfig,
};
pub use validation::{validate_config, ConfigViolation};
