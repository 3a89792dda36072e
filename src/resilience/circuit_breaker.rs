//! Circuit breaker for downstream service protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: service assumed down, calls fail fast
//! - Half-Open: probing whether the service recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failures within time_window >= failure_threshold
//! Open → Half-Open: now >= next_attempt_at (checked lazily on execute)
//! Half-Open → Closed: success_threshold successes
//! Half-Open → Open: any failure
//! ```
//!
//! # Design Decisions
//! - One breaker per service, shared through `Arc`
//! - All mutable fields behind one mutex, never held across `.await`
//! - Fail fast in Open state: no suspension point before the rejection
//! - Windowed failure count decides opening; lifetime counters feed failure_rate
//! - No background clock drives transitions; the optional monitor only logs

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::errors::taxonomy::{Classify, ErrorCategory, ErrorSeverity};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }

    fn metric_code(&self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::HalfOpen => 1,
            CircuitState::Open => 2,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable breaker settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerOptions {
    pub service_name: String,
    /// Failures within `time_window` that open the circuit.
    pub failure_threshold: u32,
    /// Successes in half-open that close the circuit.
    pub success_threshold: u32,
    pub time_window: Duration,
    /// Cooldown between opening and the first probe.
    pub timeout: Duration,
    /// Cadence of the stats logger; `None` disables it.
    pub monitor_interval: Option<Duration>,
}

impl CircuitBreakerOptions {
    /// Baseline settings for a service without a dedicated preset.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            failure_threshold: 5,
            success_threshold: 2,
            time_window: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            monitor_interval: None,
        }
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_time_window(mut self, window: Duration) -> Self {
        self.time_window = window;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A zero interval disables the monitor.
    pub fn with_monitor_interval(mut self, interval: Option<Duration>) -> Self {
        self.monitor_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Apply the fields set in `config` on top of these options.
    pub fn merged(mut self, config: &BreakerConfig) -> Self {
        if let Some(threshold) = config.failure_threshold {
            self.failure_threshold = threshold;
        }
        if let Some(threshold) = config.success_threshold {
            self.success_threshold = threshold;
        }
        if let Some(ms) = config.time_window_ms {
            self.time_window = Duration::from_millis(ms);
        }
        if let Some(ms) = config.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = config.monitor_interval_ms {
            self.monitor_interval = (ms > 0).then(|| Duration::from_millis(ms));
        }
        self
    }
}

/// Read-only snapshot of a breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    /// Failures inside the trailing time window.
    pub failure_count: u32,
    pub success_count: u32,
    /// Admitted calls over the breaker's lifetime.
    pub total_requests: u64,
    /// Failed calls over the breaker's lifetime.
    pub total_failures: u64,
    /// Calls rejected while open.
    pub total_rejections: u64,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub state_changed_at: DateTime<Utc>,
    /// Time spent in the current state.
    pub uptime: Duration,
    /// Lifetime `total_failures / total_requests`, 0.0 when idle.
    pub failure_rate: f64,
    /// When an open breaker admits its next probe.
    pub next_attempt_at: Option<Instant>,
}

/// Returned instead of invoking the operation while the breaker is open.
#[derive(Debug, Clone, Error)]
#[error("circuit breaker for '{service_name}' is open, retry after {retry_after:?}")]
pub struct CircuitBreakerOpenError {
    pub service_name: String,
    pub stats: CircuitBreakerStats,
    pub next_attempt_at: Instant,
    /// Time remaining until `next_attempt_at` when the error was raised.
    pub retry_after: Duration,
}

impl Classify for CircuitBreakerOpenError {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        Some((ErrorCategory::CircuitOpen, ErrorSeverity::High))
    }

    fn retry_after(&self) -> Option<Duration> {
        Some(self.retry_after)
    }
}

/// Error from `CircuitBreaker::execute`.
#[derive(Debug)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without invoking it.
    Open(CircuitBreakerOpenError),
    /// The operation ran and failed.
    Inner(E),
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Inner(e) => Some(e),
            BreakerError::Open(_) => None,
        }
    }
}

impl<E> From<CircuitBreakerOpenError> for BreakerError<E> {
    fn from(err: CircuitBreakerOpenError) -> Self {
        BreakerError::Open(err)
    }
}

impl<E: fmt::Display> fmt::Display for BreakerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakerError::Open(e) => e.fmt(f),
            BreakerError::Inner(e) => e.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for BreakerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BreakerError::Open(e) => Some(e),
            BreakerError::Inner(e) => Some(e),
        }
    }
}

impl<E: Classify> Classify for BreakerError<E> {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        match self {
            BreakerError::Open(e) => e.declared_category(),
            BreakerError::Inner(e) => e.declared_category(),
        }
    }

    fn status_code(&self) -> Option<u16> {
        match self {
            BreakerError::Open(_) => None,
            BreakerError::Inner(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> Option<String> {
        match self {
            BreakerError::Open(_) => None,
            BreakerError::Inner(e) => e.error_code(),
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            BreakerError::Open(e) => Classify::retry_after(e),
            BreakerError::Inner(e) => e.retry_after(),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    /// Timestamps of recent failures, oldest first.
    failures: VecDeque<Instant>,
    success_count: u32,
    total_requests: u64,
    total_failures: u64,
    total_rejections: u64,
    last_failure: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    state_changed_at: Instant,
    state_changed_wall: DateTime<Utc>,
    next_attempt_at: Option<Instant>,
}

#[derive(Debug)]
struct MonitorTask {
    stop: Shutdown,
    handle: JoinHandle<()>,
}

/// Per-service circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    options: CircuitBreakerOptions,
    inner: Mutex<BreakerInner>,
    monitor: Mutex<Option<MonitorTask>>,
}

impl CircuitBreaker {
    pub fn new(options: CircuitBreakerOptions) -> Self {
        metrics::record_breaker_state(&options.service_name, CircuitState::Closed.metric_code());
        Self {
            options,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: VecDeque::new(),
                success_count: 0,
                total_requests: 0,
                total_failures: 0,
                total_rejections: 0,
                last_failure: None,
                last_success: None,
                state_changed_at: Instant::now(),
                state_changed_wall: Utc::now(),
                next_attempt_at: None,
            }),
            monitor: Mutex::new(None),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.options.service_name
    }

    pub fn options(&self) -> &CircuitBreakerOptions {
        &self.options
    }

    /// Current state as last evaluated; does not apply pending transitions.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Run `f` under breaker protection.
    ///
    /// While open, `f` is not called and `BreakerError::Open` is returned
    /// without awaiting anything. An admitted call whose future is dropped
    /// before completing (e.g. by a timeout) counts as a failure.
    pub async fn execute<T, E, F, Fut>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.try_acquire()?;

        let mut pending = PendingCall {
            breaker: self,
            settled: false,
        };
        let result = f().await;
        pending.settled = true;

        match result {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                self.on_failure();
                Err(BreakerError::Inner(e))
            }
        }
    }

    /// Admit a call or reject it, applying lazy transitions first.
    fn try_acquire(&self) -> Result<(), CircuitBreakerOpenError> {
        let now = Instant::now();
        let mut inner = self.lock();
        self.evaluate(&mut inner, now);

        if inner.state == CircuitState::Open {
            inner.total_rejections += 1;
            let next_attempt_at = inner.next_attempt_at.unwrap_or(now + self.options.timeout);
            let stats = self.snapshot(&inner, now);
            drop(inner);

            metrics::record_breaker_rejection(self.service_name());
            tracing::debug!(service = %self.options.service_name, "Circuit open, rejecting call");
            return Err(CircuitBreakerOpenError {
                service_name: self.options.service_name.clone(),
                stats,
                next_attempt_at,
                retry_after: next_attempt_at.saturating_duration_since(now),
            });
        }

        inner.total_requests += 1;
        Ok(())
    }

    fn on_success(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.last_success = Some(Utc::now());
        inner.success_count = inner.success_count.saturating_add(1);

        if inner.state == CircuitState::HalfOpen && inner.success_count >= self.options.success_threshold {
            self.transition(&mut inner, CircuitState::Closed, now);
        }
        drop(inner);

        metrics::record_breaker_call(self.service_name(), true);
    }

    fn on_failure(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.failures.push_back(now);
        inner.total_failures += 1;
        inner.last_failure = Some(Utc::now());

        match inner.state {
            CircuitState::HalfOpen => {
                tracing::warn!(service = %self.options.service_name, "Probe failed, reopening circuit");
                self.transition(&mut inner, CircuitState::Open, now);
            }
            CircuitState::Closed => self.evaluate(&mut inner, now),
            // a call admitted before opening finished late; cooldown is untouched
            CircuitState::Open => {}
        }
        drop(inner);

        metrics::record_breaker_call(self.service_name(), false);
    }

    /// Prune the window and apply any due transition.
    fn evaluate(&self, inner: &mut BreakerInner, now: Instant) {
        let window = self.options.time_window;
        while let Some(&oldest) = inner.failures.front() {
            if now.saturating_duration_since(oldest) >= window {
                inner.failures.pop_front();
            } else {
                break;
            }
        }

        match inner.state {
            CircuitState::Closed => {
                let failures = inner.failures.len();
                if failures >= self.options.failure_threshold as usize {
                    tracing::warn!(
                        service = %self.options.service_name,
                        failures,
                        threshold = self.options.failure_threshold,
                        window = ?window,
                        "Failure threshold reached"
                    );
                    self.transition(inner, CircuitState::Open, now);
                }
            }
            CircuitState::Open => {
                if inner.next_attempt_at.is_some_and(|at| now >= at) {
                    self.transition(inner, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    /// Move to `to`. Re-entering the current state is a no-op.
    fn transition(&self, inner: &mut BreakerInner, to: CircuitState, now: Instant) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        inner.state_changed_at = now;
        inner.state_changed_wall = Utc::now();

        match to {
            CircuitState::Open => {
                inner.next_attempt_at = Some(now + self.options.timeout);
                tracing::warn!(
                    service = %self.options.service_name,
                    from = %from,
                    cooldown = ?self.options.timeout,
                    "Circuit breaker opened"
                );
            }
            CircuitState::HalfOpen => {
                inner.success_count = 0;
                inner.next_attempt_at = None;
                tracing::info!(service = %self.options.service_name, "Circuit breaker half-open, probing");
            }
            CircuitState::Closed => {
                inner.failures.clear();
                inner.success_count = 0;
                inner.next_attempt_at = None;
                tracing::info!(service = %self.options.service_name, from = %from, "Circuit breaker closed");
            }
        }

        metrics::record_breaker_transition(self.service_name(), from.as_str(), to.as_str());
        metrics::record_breaker_state(self.service_name(), to.metric_code());
    }

    /// Open the circuit now, regardless of recent outcomes.
    pub fn force_open(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        tracing::warn!(service = %self.options.service_name, "Circuit breaker forced open");
        self.transition(&mut inner, CircuitState::Open, now);
    }

    /// Close the circuit now and forget recent failures.
    pub fn force_closed(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        tracing::info!(service = %self.options.service_name, "Circuit breaker forced closed");
        self.transition(&mut inner, CircuitState::Closed, now);
        inner.failures.clear();
        inner.success_count = 0;
    }

    /// Snapshot of the breaker. Has no side effects.
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.lock();
        self.snapshot(&inner, Instant::now())
    }

    fn snapshot(&self, inner: &BreakerInner, now: Instant) -> CircuitBreakerStats {
        let window = self.options.time_window;
        let failure_count = inner
            .failures
            .iter()
            .filter(|&&at| now.saturating_duration_since(at) < window)
            .count();
        let failure_rate = if inner.total_requests == 0 {
            0.0
        } else {
            inner.total_failures as f64 / inner.total_requests as f64
        };

        CircuitBreakerStats {
            state: inner.state,
            failure_count: u32::try_from(failure_count).unwrap_or(u32::MAX),
            success_count: inner.success_count,
            total_requests: inner.total_requests,
            total_failures: inner.total_failures,
            total_rejections: inner.total_rejections,
            last_failure_time: inner.last_failure,
            last_success_time: inner.last_success,
            state_changed_at: inner.state_changed_wall,
            uptime: now.saturating_duration_since(inner.state_changed_at),
            failure_rate,
            next_attempt_at: inner.next_attempt_at.filter(|_| inner.state == CircuitState::Open),
        }
    }

    /// Start the periodic stats logger if `monitor_interval` is set.
    ///
    /// Returns whether a monitor is running afterwards. Requires a Tokio runtime.
    pub fn start_monitor(self: &Arc<Self>) -> bool {
        let Some(interval) = self.options.monitor_interval.filter(|d| !d.is_zero()) else {
            return false;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(service = %self.options.service_name, "No runtime available, monitor not started");
            return false;
        };

        let mut slot = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return true;
        }

        let stop = Shutdown::new();
        let mut stop_rx = stop.subscribe();
        let breaker = Arc::downgrade(self);
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(breaker) = breaker.upgrade() else { break };
                        breaker.log_stats();
                    }
                    _ = stop_rx.recv() => break,
                }
            }
        });

        tracing::debug!(service = %self.options.service_name, interval = ?interval, "Circuit breaker monitor started");
        *slot = Some(MonitorTask { stop, handle });
        true
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    fn log_stats(&self) {
        let stats = self.stats();
        tracing::info!(
            service = %self.options.service_name,
            state = %stats.state,
            failure_count = stats.failure_count,
            success_count = stats.success_count,
            total_requests = stats.total_requests,
            failure_rate = stats.failure_rate,
            "Circuit breaker stats"
        );
    }

    /// Stop the monitor task. Safe to call more than once.
    pub fn destroy(&self) {
        let task = self.monitor.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.stop.trigger();
            task.handle.abort();
            tracing::debug!(service = %self.options.service_name, "Circuit breaker monitor stopped");
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records a failure for an admitted call that never settled.
struct PendingCall<'a> {
    breaker: &'a CircuitBreaker,
    settled: bool,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(
                service = %self.breaker.options.service_name,
                "Call dropped before completion, recording failure"
            );
            self.breaker.on_failure();
        }
    }
}

impl Drop for CircuitBreaker {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CircuitBreakerOptions {
        CircuitBreakerOptions::new("test")
            .with_failure_threshold(3)
            .with_success_threshold(2)
            .with_time_window(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(30))
    }

    async fn fail(cb: &CircuitBreaker) {
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
    }

    async fn succeed(cb: &CircuitBreaker) {
        let _ = cb.execute(|| async { Ok::<_, &str>(()) }).await;
    }

    #[test]
    fn test_initial_stats() {
        let cb = CircuitBreaker::new(options());
        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.failure_count, 0);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.failure_rate, 0.0);
        assert!(stats.next_attempt_at.is_none());
    }

    #[test]
    fn test_merged_options() {
        let merged = options().merged(&BreakerConfig {
            failure_threshold: Some(9),
            monitor_interval_ms: Some(0),
            timeout_ms: Some(1500),
            ..Default::default()
        });
        assert_eq!(merged.failure_threshold, 9);
        assert_eq!(merged.success_threshold, 2);
        assert_eq!(merged.timeout, Duration::from_millis(1500));
        assert_eq!(merged.monitor_interval, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_on_threshold() {
        let cb = CircuitBreaker::new(options());
        fail(&cb).await;
        fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);

        let stats = cb.stats();
        assert_eq!(stats.failure_count, 3);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.failure_rate, 1.0);
        assert!(stats.next_attempt_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rate_is_lifetime() {
        let cb = CircuitBreaker::new(options());
        succeed(&cb).await;
        fail(&cb).await;
        tokio::time::advance(Duration::from_secs(120)).await;

        let stats = cb.stats();
        assert_eq!(stats.failure_count, 0, "window expired");
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.failure_rate, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_error_details() {
        let cb = CircuitBreaker::new(options());
        cb.force_open();
        tokio::time::advance(Duration::from_secs(10)).await;

        let err = cb.execute(|| async { Ok::<_, &str>(()) }).await.unwrap_err();
        let BreakerError::Open(open) = err else {
            panic!("expected open error");
        };
        assert_eq!(open.service_name, "test");
        assert_eq!(open.retry_after, Duration::from_secs(20));
        assert_eq!(open.stats.state, CircuitState::Open);
        assert_eq!(open.stats.total_rejections, 1);
        assert!(open.to_string().contains("'test' is open"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_closed_resets() {
        let cb = CircuitBreaker::new(options());
        for _ in 0..3 {
            fail(&cb).await;
        }
        cb.force_closed();

        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.failure_count, 0);
        assert_eq!(stats.total_failures, 3, "lifetime counters survive");

        fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_needs_success_threshold() {
        let cb = CircuitBreaker::new(options());
        cb.force_open();
        tokio::time::advance(Duration::from_secs(30)).await;

        succeed(&cb).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.stats().success_count, 1);
        succeed(&cb).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.stats().success_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_lifecycle() {
        let cb = Arc::new(CircuitBreaker::new(
            options().with_monitor_interval(Some(Duration::from_secs(5))),
        ));
        assert!(cb.start_monitor());
        assert!(cb.start_monitor(), "second start is a no-op");
        assert!(cb.is_monitoring());

        cb.destroy();
        cb.destroy();
        tokio::task::yield_now().await;
        assert!(!cb.is_monitoring());
    }

    #[test]
    fn test_monitor_needs_interval() {
        let cb = Arc::new(CircuitBreaker::new(options()));
        assert!(!cb.start_monitor());
    }

    #[tokio::test]
    async fn test_zero_monitor_interval_is_disabled() {
        let opts = options().with_monitor_interval(Some(Duration::ZERO));
        assert_eq!(opts.monitor_interval, None);

        let mut opts = options();
        opts.monitor_interval = Some(Duration::ZERO);
        let cb = Arc::new(CircuitBreaker::new(opts));
        assert!(!cb.start_monitor());
        assert!(!cb.is_monitoring());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_count_saturates() {
        let cb = CircuitBreaker::new(options());
        cb.lock().success_count = u32::MAX;
        succeed(&cb).await;
        assert_eq!(cb.stats().success_count, u32::MAX);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_call_counts_as_failure() {
        let cb = CircuitBreaker::new(options().with_failure_threshold(1));
        let timed_out = tokio::time::timeout(
            Duration::from_secs(1),
            cb.execute(std::future::pending::<Result<(), &str>>),
        )
        .await;
        assert!(timed_out.is_err());

        let stats = cb.stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.total_failures, 1);
        assert!(stats.last_failure_time.is_some());
        assert_eq!(stats.state, CircuitState::Open);
    }
}
