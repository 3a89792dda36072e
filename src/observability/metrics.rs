//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_breaker_state` (gauge): 0=closed, 1=half-open, 2=open, by service
//! - `guard_breaker_transitions_total` (counter): state changes by service, from, to
//! - `guard_breaker_rejections_total` (counter): fast-failed calls by service
//! - `guard_breaker_calls_total` (counter): executed calls by service, outcome
//! - `guard_retries_total` (counter): scheduled retries by service
//! - `guard_errors_total` (counter): reported errors by category, severity
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_breaker_state(service: &str, state_code: u8) {
    gauge!("guard_breaker_state", "service" => service.to_owned()).set(f64::from(state_code));
}

pub fn record_breaker_transition(service: &str, from: &'static str, to: &'static str) {
    counter!(
        "guard_breaker_transitions_total",
        "service" => service.to_owned(),
        "from" => from,
        "to" => to
    )
    .increment(1);
}

pub fn record_breaker_rejection(service: &str) {
    counter!("guard_breaker_rejections_total", "service" => service.to_owned()).increment(1);
}

pub fn record_breaker_call(service: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "guard_breaker_calls_total",
        "service" => service.to_owned(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_retry(service: &str) {
    counter!("guard_retries_total", "service" => service.to_owned()).increment(1);
}

pub fn record_error(category: &'static str, severity: &'static str) {
    counter!(
        "guard_errors_total",
        "category" => category,
        "severity" => severity
    )
    .increment(1);
}
