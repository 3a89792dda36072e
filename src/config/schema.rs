//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.
//! Durations are expressed in milliseconds (`*_ms`) or seconds (`*_secs`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Health/admin HTTP listener.
    pub listener: ListenerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Administrative endpoints.
    pub admin: AdminConfig,

    /// Per-service circuit breaker overrides, keyed by service name.
    pub breakers: BTreeMap<String, BreakerConfig>,

    /// Per-service retry policy overrides, keyed by service name.
    pub retries: BTreeMap<String, RetryConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout for the health/admin surface in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the force-open / force-close endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Circuit breaker settings for one service.
///
/// Unset fields fall back to the service's built-in defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures within the window that open the circuit.
    pub failure_threshold: Option<u32>,

    /// Successes in half-open needed to close the circuit.
    pub success_threshold: Option<u32>,

    /// Sliding window for counting failures, in milliseconds.
    pub time_window_ms: Option<u64>,

    /// Cooldown before probing an open circuit, in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Stats logging cadence in milliseconds; 0 disables the monitor.
    pub monitor_interval_ms: Option<u64>,
}

/// Retry policy settings for one service.
///
/// Unset fields fall back to the service's built-in preset.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub max_attempts: Option<u32>,

    /// Delay before the second attempt in milliseconds.
    pub initial_delay_ms: Option<u64>,

    /// Upper bound for the computed delay in milliseconds.
    pub max_delay_ms: Option<u64>,

    /// Growth factor between consecutive delays.
    pub backoff_multiplier: Option<f64>,

    /// Random inflation fraction (0.0 - 1.0).
    pub jitter: Option<f64>,
}
