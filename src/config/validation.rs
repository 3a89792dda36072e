//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ConfigViolation>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BreakerConfig, GuardConfig, RetryConfig};

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConfigViolation {
    pub field: String,
    pub message: String,
}

impl ConfigViolation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check value ranges and addresses.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ConfigViolation>> {
    let mut violations = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        violations.push(ConfigViolation::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        violations.push(ConfigViolation::new("listener.request_timeout_secs", "must be > 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        violations.push(ConfigViolation::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }
    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        violations.push(ConfigViolation::new("admin.api_key", "must not be empty when admin is enabled"));
    }

    for (name, breaker) in &config.breakers {
        validate_breaker(&format!("breakers.{name}"), breaker, &mut violations);
    }
    for (name, retry) in &config.retries {
        validate_retry(&format!("retries.{name}"), retry, &mut violations);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn validate_breaker(prefix: &str, breaker: &BreakerConfig, violations: &mut Vec<ConfigViolation>) {
    if breaker.failure_threshold == Some(0) {
        violations.push(ConfigViolation::new(format!("{prefix}.failure_threshold"), "must be >= 1"));
    }
    if breaker.success_threshold == Some(0) {
        violations.push(ConfigViolation::new(format!("{prefix}.success_threshold"), "must be >= 1"));
    }
    if breaker.time_window_ms == Some(0) {
        violations.push(ConfigViolation::new(format!("{prefix}.time_window_ms"), "must be > 0"));
    }
    if breaker.timeout_ms == Some(0) {
        violations.push(ConfigViolation::new(format!("{prefix}.timeout_ms"), "must be > 0"));
    }
}

fn validate_retry(prefix: &str, retry: &RetryConfig, violations: &mut Vec<ConfigViolation>) {
    if retry.max_attempts == Some(0) {
        violations.push(ConfigViolation::new(format!("{prefix}.max_attempts"), "must be >= 1"));
    }
    if let Some(multiplier) = retry.backoff_multiplier {
        if multiplier.is_nan() || multiplier < 1.0 {
            violations.push(ConfigViolation::new(format!("{prefix}.backoff_multiplier"), "must be >= 1.0"));
        }
    }
    if let Some(jitter) = retry.jitter {
        if !(0.0..=1.0).contains(&jitter) {
            violations.push(ConfigViolation::new(format!("{prefix}.jitter"), "must be between 0.0 and 1.0"));
        }
    }
    if let (Some(initial), Some(max)) = (retry.initial_delay_ms, retry.max_delay_ms) {
        if max < initial {
            violations.push(ConfigViolation::new(
                format!("{prefix}.max_delay_ms"),
                "must be >= initial_delay_ms",
            ));
        }
    }
}
