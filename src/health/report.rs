//! Serializable health views over breaker stats.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::resilience::circuit_breaker::{CircuitBreakerStats, CircuitState};
use crate::resilience::registry::CircuitBreakerRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: &'static str,
    pub open_circuits: Vec<String>,
}

impl HealthReport {
    pub fn from_registry(registry: &CircuitBreakerRegistry) -> Self {
        let open_circuits: Vec<String> = registry
            .get_all_stats()
            .into_iter()
            .filter(|(_, stats)| stats.state == CircuitState::Open)
            .map(|(name, _)| name)
            .collect();

        Self {
            status: if open_circuits.is_empty() {
                HealthStatus::Ok
            } else {
                HealthStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION"),
            open_circuits,
        }
    }
}

/// One entry of `GET /health/circuit-breakers`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerHealth {
    pub state: CircuitState,
    /// Lifetime failure rate as a percentage, e.g. "12.50%".
    pub failure_rate: String,
    pub failure_count: u32,
    pub total_requests: u64,
    pub total_failures: u64,
    pub total_rejections: u64,
    pub last_failure: Option<String>,
    pub last_success: Option<String>,
    /// Milliseconds in the current state.
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_attempt: Option<String>,
}

impl BreakerHealth {
    pub fn from_stats(stats: &CircuitBreakerStats) -> Self {
        Self {
            state: stats.state,
            failure_rate: format_percent(stats.failure_rate),
            failure_count: stats.failure_count,
            total_requests: stats.total_requests,
            total_failures: stats.total_failures,
            total_rejections: stats.total_rejections,
            last_failure: stats.last_failure_time.map(rfc3339),
            last_success: stats.last_success_time.map(rfc3339),
            uptime: millis(stats.uptime),
            next_attempt: stats
                .next_attempt_at
                .filter(|_| stats.state == CircuitState::Open)
                .map(|at| rfc3339(wall_clock(at))),
        }
    }
}

/// Health view of every registered breaker, keyed by service name.
pub fn breaker_health(registry: &CircuitBreakerRegistry) -> BTreeMap<String, BreakerHealth> {
    registry
        .get_all_stats()
        .iter()
        .map(|(name, stats)| (name.clone(), BreakerHealth::from_stats(stats)))
        .collect()
}

/// Wall-clock time corresponding to a monotonic instant.
pub fn wall_clock(at: Instant) -> DateTime<Utc> {
    let now = Instant::now();
    let wall = Utc::now();
    let offset = |d: Duration| chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero());
    if at >= now {
        wall + offset(at - now)
    } else {
        wall - offset(now - at)
    }
}

pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(0.125), "12.50%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[tokio::test]
    async fn test_wall_clock_future() {
        let at = Instant::now() + Duration::from_secs(30);
        let delta = wall_clock(at) - Utc::now();
        assert!(delta > chrono::Duration::seconds(29));
        assert!(delta <= chrono::Duration::seconds(30));
    }

    #[test]
    fn test_report_degraded_when_open() {
        let registry = CircuitBreakerRegistry::new();
        registry.get_circuit_breaker("chat", None).unwrap();
        assert_eq!(HealthReport::from_registry(&registry).status, HealthStatus::Ok);

        registry.get_circuit_breaker("ai", None).unwrap().force_open();
        let report = HealthReport::from_registry(&registry);
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.open_circuits, vec!["ai".to_string()]);
    }

    #[test]
    fn test_breaker_health_json_shape() {
        let registry = CircuitBreakerRegistry::new();
        let cb = registry.get_circuit_breaker("ticketing", None).unwrap();

        let closed = serde_json::to_value(BreakerHealth::from_stats(&cb.stats())).unwrap();
        assert_eq!(closed["state"], "CLOSED");
        assert_eq!(closed["failureRate"], "0.00%");
        assert!(closed["lastFailure"].is_null());
        assert!(closed.get("nextAttempt").is_none());

        cb.force_open();
        let open = serde_json::to_value(BreakerHealth::from_stats(&cb.stats())).unwrap();
        assert_eq!(open["state"], "OPEN");
        let next = open["nextAttempt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(next).is_ok());
    }
}
