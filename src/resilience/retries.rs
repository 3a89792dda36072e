//! Retry executor.
//!
//! # Responsibilities
//! - Invoke an operation until it succeeds, the predicate declines, or attempts run out
//! - Sleep with exponential backoff + jitter between attempts (non-blocking)
//! - Record one detail entry per attempt for diagnostics
//!
//! # Design Decisions
//! - `retry_with_backoff` never fails; the outcome lives in `RetryResult`
//! - `with_retry` is the `?`-friendly wrapper returning the final error
//! - No delay is computed or slept after the final attempt
//! - A `retry_after` hook may replace the computed delay (rate-limit hints)

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::errors::taxonomy::{is_transient_message, Classify};
use crate::resilience::backoff::Backoff;

pub type ShouldRetryFn<E> = Arc<dyn Fn(&E, u32) -> bool + Send + Sync>;
pub type OnRetryFn<E> = Arc<dyn Fn(&E, u32, Duration) + Send + Sync>;
pub type RetryAfterFn<E> = Arc<dyn Fn(&E) -> Option<Duration> + Send + Sync>;

/// How an operation is retried.
pub struct RetryOptions<E> {
    /// Total attempts including the first; values below 1 are treated as 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Fraction of the delay added at random, 0.0 - 1.0.
    pub jitter: f64,
    should_retry: Option<ShouldRetryFn<E>>,
    on_retry: Option<OnRetryFn<E>>,
    retry_after: Option<RetryAfterFn<E>>,
}

impl<E> RetryOptions<E> {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            ..Self::default()
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the default transient-failure predicate.
    pub fn with_should_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&E, u32) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(f));
        self
    }

    /// Hook called before each sleep with the failed attempt and chosen delay.
    pub fn with_on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&E, u32, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(f));
        self
    }

    /// Hook that may override the computed delay for a given error.
    pub fn with_retry_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> Option<Duration> + Send + Sync + 'static,
    {
        self.retry_after = Some(Arc::new(f));
        self
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        let backoff = Backoff::default();
        Self {
            max_attempts: 3,
            initial_delay: backoff.initial_delay,
            max_delay: backoff.max_delay,
            backoff_multiplier: backoff.multiplier,
            jitter: backoff.jitter,
            should_retry: None,
            on_retry: None,
            retry_after: None,
        }
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            should_retry: self.should_retry.clone(),
            on_retry: self.on_retry.clone(),
            retry_after: self.retry_after.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter", &self.jitter)
            .field("custom_should_retry", &self.should_retry.is_some())
            .finish_non_exhaustive()
    }
}

/// One attempt made by the executor.
#[derive(Debug, Clone)]
pub struct AttemptDetail {
    /// 1-indexed attempt number.
    pub attempt: u32,
    /// Failure message, if the attempt failed.
    pub error: Option<String>,
    /// Delay slept after this attempt; `None` for the last one.
    pub delay: Option<Duration>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of `retry_with_backoff`.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    pub outcome: Result<T, E>,
    pub attempts: u32,
    pub total_time: Duration,
    pub attempt_details: Vec<AttemptDetail>,
}

impl<T, E> RetryResult<T, E> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&E> {
        self.outcome.as_ref().err()
    }

    /// Delays actually slept, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        self.attempt_details.iter().filter_map(|d| d.delay)
    }

    pub fn into_result(self) -> Result<T, E> {
        self.outcome
    }
}

/// Retry when the message looks transient or the status is a server error.
pub fn default_should_retry<E: Classify + ?Sized>(error: &E, _attempt: u32) -> bool {
    is_transient_message(&error.to_string()) || error.status_code().is_some_and(|s| s >= 500)
}

/// Run `operation` under `options`, never failing.
pub async fn retry_with_backoff<T, E, F, Fut>(mut operation: F, options: &RetryOptions<E>) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    let started = Instant::now();
    let max_attempts = options.max_attempts.max(1);
    let backoff = options.backoff();
    let mut attempt_details = Vec::new();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let timestamp = Utc::now();

        let error = match operation().await {
            Ok(data) => {
                attempt_details.push(AttemptDetail {
                    attempt,
                    error: None,
                    delay: None,
                    timestamp,
                });
                if attempt > 1 {
                    tracing::debug!(attempts = attempt, "Operation succeeded after retry");
                }
                return RetryResult {
                    outcome: Ok(data),
                    attempts: attempt,
                    total_time: started.elapsed(),
                    attempt_details,
                };
            }
            Err(error) => error,
        };

        let retry = attempt < max_attempts
            && match &options.should_retry {
                Some(should_retry) => should_retry(&error, attempt),
                None => default_should_retry(&error, attempt),
            };

        if !retry {
            attempt_details.push(AttemptDetail {
                attempt,
                error: Some(error.to_string()),
                delay: None,
                timestamp,
            });
            tracing::debug!(
                attempts = attempt,
                max_attempts,
                error = %error,
                "Giving up on operation"
            );
            return RetryResult {
                outcome: Err(error),
                attempts: attempt,
                total_time: started.elapsed(),
                attempt_details,
            };
        }

        let delay = options
            .retry_after
            .as_ref()
            .and_then(|hint| hint(&error))
            .unwrap_or_else(|| backoff.delay(attempt));

        attempt_details.push(AttemptDetail {
            attempt,
            error: Some(error.to_string()),
            delay: Some(delay),
            timestamp,
        });
        tracing::debug!(attempt, delay = ?delay, error = %error, "Retrying operation");
        if let Some(on_retry) = &options.on_retry {
            on_retry(&error, attempt, delay);
        }

        tokio::time::sleep(delay).await;
    }
}

/// Run `operation` under `options`, returning the final error on failure.
pub async fn with_retry<T, E, F, Fut>(operation: F, options: &RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    retry_with_backoff(operation, options).await.into_result()
}
