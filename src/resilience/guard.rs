//! Breaker + retry composition for one downstream service.
//!
//! ```text
//! call(op)
//!     → circuit_breaker.execute (fail fast while open)
//!         → policy.run (retries with backoff)
//!             → op()
//! ```
//!
//! The breaker sees one outcome per `call`, not one per attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::errors::taxonomy::{Classify, ErrorCategory, ErrorSeverity};
use crate::errors::types::ServiceError;
use crate::resilience::circuit_breaker::{BreakerError, CircuitBreaker, CircuitBreakerOpenError};
use crate::resilience::policies::DomainPolicy;
use crate::resilience::registry::{CircuitBreakerRegistry, RegistryError};
use crate::services::Service;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Open(#[from] CircuitBreakerOpenError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<BreakerError<ServiceError>> for GuardError {
    fn from(err: BreakerError<ServiceError>) -> Self {
        match err {
            BreakerError::Open(e) => GuardError::Open(e),
            BreakerError::Inner(e) => GuardError::Service(e),
        }
    }
}

impl Classify for GuardError {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        match self {
            GuardError::Open(e) => e.declared_category(),
            GuardError::Service(e) => e.declared_category(),
        }
    }

    fn status_code(&self) -> Option<u16> {
        match self {
            GuardError::Open(_) => None,
            GuardError::Service(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> Option<String> {
        match self {
            GuardError::Open(_) => None,
            GuardError::Service(e) => e.error_code(),
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            GuardError::Open(e) => Some(e.retry_after),
            GuardError::Service(e) => e.retry_after,
        }
    }
}

/// Protected entry point for calls to one service.
#[derive(Debug, Clone)]
pub struct ServiceGuard {
    breaker: Arc<CircuitBreaker>,
    policy: DomainPolicy,
}

impl ServiceGuard {
    /// Guard using the registry's breaker and the built-in retry preset.
    pub fn new(registry: &CircuitBreakerRegistry, service: Service) -> Result<Self, RegistryError> {
        Ok(Self {
            breaker: registry.for_service(service)?,
            policy: DomainPolicy::for_service(service),
        })
    }

    pub fn with_policy(mut self, policy: DomainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn service(&self) -> Service {
        self.policy.service
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, GuardError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + Send + Sync + 'static,
    {
        self.breaker
            .execute(|| self.policy.run(operation))
            .await
            .map_err(GuardError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::errors::types::RemoteError;
    use crate::resilience::circuit_breaker::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_delay() -> RetryConfig {
        RetryConfig {
            initial_delay_ms: Some(0),
            jitter: Some(0.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_breaker_counts_one_failure_per_call() {
        let registry = CircuitBreakerRegistry::new();
        let guard = ServiceGuard::new(&registry, Service::Chat).unwrap();
        let guard = guard.clone().with_policy(guard.policy().clone().with_overrides(&no_delay()));
        let calls = AtomicU32::new(0);

        let counter = &calls;
        let result = guard
            .call(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RemoteError::http(503, "down"))
            })
            .await;

        assert!(matches!(result, Err(GuardError::Service(ref e)) if e.attempts == 3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let stats = guard.breaker().stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.failure_count, 1);
    }

    #[tokio::test]
    async fn test_open_breaker_skips_operation() {
        let registry = CircuitBreakerRegistry::new();
        let guard = ServiceGuard::new(&registry, Service::Ai).unwrap();
        guard.breaker().force_open();
        let calls = AtomicU32::new(0);

        let counter = &calls;
        let err = guard
            .call(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RemoteError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::Open(_)));
        assert_eq!(err.declared_category().map(|c| c.0), Some(ErrorCategory::CircuitOpen));
        assert!(err.retry_after().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(guard.breaker().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_success_passes_value_through() {
        let registry = CircuitBreakerRegistry::new();
        let guard = ServiceGuard::new(&registry, Service::Ticketing).unwrap();
        let value = guard.call(|| async { Ok::<_, RemoteError>(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(guard.service(), Service::Ticketing);
    }
}
