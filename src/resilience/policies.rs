//! Per-dependency retry policies.
//!
//! # Responsibilities
//! - Tune attempts and backoff per downstream service
//! - Decide which failures each service should retry
//! - Honor `Retry-After` hints instead of the computed delay
//! - Wrap the final failure in a `ServiceError` for upstream classification
//!
//! # Retried failures
//! ```text
//! all services: network, timeout, HTTP 408, 429, 502, 503, 504
//! ai:           additionally HTTP 500 and 529 (overloaded)
//! ```

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{GuardConfig, RetryConfig};
use crate::errors::report::report_error;
use crate::errors::taxonomy::{classify, Classify, ErrorCategory};
use crate::errors::types::ServiceError;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::resilience::retries::{retry_with_backoff, RetryOptions};
use crate::services::Service;

/// Retry policy bound to one downstream service.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainPolicy {
    pub service: Service,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl DomainPolicy {
    /// Built-in preset for `service`.
    pub fn for_service(service: Service) -> Self {
        let (max_attempts, initial_ms, max_ms, jitter) = match service {
            Service::Ticketing | Service::TaskManagement => (3, 1000, 10_000, 0.1),
            Service::Chat => (3, 500, 5000, 0.1),
            Service::Ai => (3, 2000, 30_000, 0.2),
        };

        Self {
            service,
            max_attempts,
            backoff: Backoff {
                initial_delay: Duration::from_millis(initial_ms),
                max_delay: Duration::from_millis(max_ms),
                multiplier: 2.0,
                jitter,
            },
        }
    }

    /// Preset with the `[retries.<service>]` section applied, if present.
    pub fn from_config(service: Service, config: &GuardConfig) -> Self {
        let policy = Self::for_service(service);
        match config.retries.get(service.as_str()) {
            Some(overrides) => policy.with_overrides(overrides),
            None => policy,
        }
    }

    pub fn with_overrides(mut self, overrides: &RetryConfig) -> Self {
        if let Some(max_attempts) = overrides.max_attempts {
            self.max_attempts = max_attempts;
        }
        if let Some(ms) = overrides.initial_delay_ms {
            self.backoff.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.max_delay_ms {
            self.backoff.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = overrides.backoff_multiplier {
            self.backoff.multiplier = multiplier;
        }
        if let Some(jitter) = overrides.jitter {
            self.backoff.jitter = jitter;
        }
        self
    }

    /// Whether this service should retry a response with `status`.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        match (self.service, status) {
            (_, 408 | 429 | 502 | 503 | 504) => true,
            (Service::Ai, 500 | 529) => true,
            _ => false,
        }
    }

    /// Retry decision for this service.
    pub fn should_retry<E: Classify + ?Sized>(&self, error: &E) -> bool {
        if let Some(status) = error.status_code() {
            return self.is_retryable_status(status);
        }
        matches!(
            classify(error).category,
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::RateLimit
        )
    }

    /// Executor options carrying this policy's predicate, logging and hint handling.
    pub fn retry_options<E>(&self) -> RetryOptions<E>
    where
        E: Classify + 'static,
    {
        let predicate = self.clone();
        let service = self.service;
        RetryOptions::new(self.max_attempts, self.backoff.initial_delay, self.backoff.max_delay)
            .with_multiplier(self.backoff.multiplier)
            .with_jitter(self.backoff.jitter)
            .with_should_retry(move |error: &E, _attempt| predicate.should_retry(error))
            .with_retry_after(|error: &E| error.retry_after())
            .with_on_retry(move |error: &E, attempt, delay| {
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                match service {
                    // chat throttling is routine; keep it out of warn-level logs
                    Service::Chat => tracing::info!(
                        service = %service,
                        attempt,
                        delay_ms,
                        status = ?error.status_code(),
                        error = %error,
                        "Retrying chat request"
                    ),
                    _ => tracing::warn!(
                        service = %service,
                        attempt,
                        delay_ms,
                        status = ?error.status_code(),
                        error = %error,
                        "Retrying request"
                    ),
                }
                metrics::record_retry(service.as_str());
            })
    }

    /// Run `operation` with retries, wrapping the final failure.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + Send + Sync + 'static,
    {
        let result = retry_with_backoff(operation, &self.retry_options()).await;
        let attempts = result.attempts;
        let elapsed_ms = result.total_time.as_millis();

        result.into_result().map_err(|error| {
            let err = ServiceError::wrap(self.service, error, attempts)
                .with_context("elapsed_ms", elapsed_ms.to_string());
            report_error(&err, self.service.as_str());
            err
        })
    }
}

/// Parse a `Retry-After` header value: delta-seconds or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    if let Ok(seconds) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(seconds).ok();
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.with_timezone(&Utc) - Utc::now();
    Some(remaining.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::types::RemoteError;

    #[test]
    fn test_presets_are_distinct() {
        let chat = DomainPolicy::for_service(Service::Chat);
        let ai = DomainPolicy::for_service(Service::Ai);
        assert_eq!(chat.backoff.initial_delay, Duration::from_millis(500));
        assert_eq!(ai.backoff.max_delay, Duration::from_secs(30));
        assert_ne!(chat, ai);
    }

    #[test]
    fn test_should_retry_statuses() {
        let ticketing = DomainPolicy::for_service(Service::Ticketing);
        for status in [408, 429, 502, 503, 504] {
            assert!(ticketing.should_retry(&RemoteError::http(status, "x")), "{status}");
        }
        for status in [400, 401, 403, 404, 500] {
            assert!(!ticketing.should_retry(&RemoteError::http(status, "x")), "{status}");
        }

        let ai = DomainPolicy::for_service(Service::Ai);
        assert!(ai.should_retry(&RemoteError::http(529, "overloaded")));
        assert!(ai.should_retry(&RemoteError::http(500, "internal")));
    }

    #[test]
    fn test_should_retry_transport_errors() {
        let chat = DomainPolicy::for_service(Service::Chat);
        assert!(chat.should_retry(&RemoteError::Network("reset".into())));
        assert!(chat.should_retry(&RemoteError::Timeout(Duration::from_secs(5))));
        assert!(chat.should_retry("fetch failed"));
        assert!(!chat.should_retry("invalid_auth"));
    }

    #[test]
    fn test_with_overrides() {
        let policy = DomainPolicy::for_service(Service::TaskManagement).with_overrides(&RetryConfig {
            max_attempts: Some(5),
            jitter: Some(0.0),
            ..Default::default()
        });
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff.jitter, 0.0);
        assert_eq!(policy.backoff.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_from_config() {
        let mut config = GuardConfig::default();
        config.retries.insert(
            "ai".into(),
            RetryConfig {
                max_attempts: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(DomainPolicy::from_config(Service::Ai, &config).max_attempts, 1);
        assert_eq!(DomainPolicy::from_config(Service::Chat, &config).max_attempts, 3);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("-3"), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_parse_retry_after_out_of_range() {
        assert_eq!(parse_retry_after("1e20"), None);
        assert_eq!(parse_retry_after("1e400"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after("1e3"), Some(Duration::from_secs(1000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_honors_retry_after_and_wraps() {
        let policy = DomainPolicy::for_service(Service::Ticketing);
        let started = tokio::time::Instant::now();

        let err = policy
            .run(|| async {
                Err::<(), _>(
                    RemoteError::http(429, "rate limited")
                        .with_code("TOO_MANY")
                        .with_retry_after(Duration::from_secs(20)),
                )
            })
            .await
            .unwrap_err();

        // two sleeps of the hinted delay, not the 1s/2s backoff
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(40), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(40_010), "{elapsed:?}");
        assert_eq!(err.service, Service::Ticketing);
        assert_eq!(err.status, Some(429));
        assert_eq!(err.code.as_deref(), Some("TOO_MANY"));
        assert_eq!(err.attempts, 3);
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.context.contains_key("elapsed_ms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_retry_auth_failures() {
        let policy = DomainPolicy::for_service(Service::Chat);
        let err = policy
            .run(|| async { Err::<(), _>(RemoteError::http(401, "invalid_auth")) })
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(err.category, ErrorCategory::Authentication);
    }
}
