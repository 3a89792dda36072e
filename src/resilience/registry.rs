//! Circuit breaker registry.
//!
//! # Responsibilities
//! - Lazily create one breaker per service name, memoized
//! - Merge per-service defaults with caller or config overrides
//! - Aggregate stats for health reporting
//! - Tear down every breaker's monitor on shutdown
//!
//! # Design Decisions
//! - Explicit context object shared via `Arc`, no process-global map
//! - DashMap entry API makes concurrent first lookups create a single instance
//! - Options are fixed at creation; later overrides for an existing name are ignored

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;

use crate::config::{BreakerConfig, GuardConfig};
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerOptions, CircuitBreakerStats};
use crate::services::Service;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no circuit breaker defaults for service '{0}' and no options supplied")]
    UnknownService(String),
}

/// Built-in breaker settings for a known service.
pub fn default_options(service: Service) -> CircuitBreakerOptions {
    let options = CircuitBreakerOptions::new(service.as_str())
        .with_monitor_interval(Some(Duration::from_secs(60)));

    match service {
        Service::Ticketing | Service::TaskManagement => options
            .with_failure_threshold(5)
            .with_success_threshold(2)
            .with_time_window(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(30)),
        Service::Chat => options
            .with_failure_threshold(3)
            .with_success_threshold(1)
            .with_time_window(Duration::from_secs(30))
            .with_timeout(Duration::from_secs(15)),
        Service::Ai => options
            .with_failure_threshold(3)
            .with_success_threshold(2)
            .with_time_window(Duration::from_secs(120))
            .with_timeout(Duration::from_secs(60)),
    }
}

/// Keyed cache of circuit breakers.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    defaults: HashMap<String, CircuitBreakerOptions>,
}

impl CircuitBreakerRegistry {
    /// Registry with the built-in defaults for every known service.
    pub fn new() -> Self {
        Self::with_defaults(Service::ALL.into_iter().map(default_options))
    }

    pub fn with_defaults(defaults: impl IntoIterator<Item = CircuitBreakerOptions>) -> Self {
        Self {
            breakers: DashMap::new(),
            defaults: defaults
                .into_iter()
                .map(|options| (options.service_name.clone(), options))
                .collect(),
        }
    }

    /// Built-in defaults with `[breakers.*]` sections applied.
    ///
    /// Sections for names without a built-in default start from the baseline options.
    pub fn from_config(config: &GuardConfig) -> Self {
        let mut registry = Self::new();
        for (name, overrides) in &config.breakers {
            let base = registry
                .defaults
                .remove(name)
                .unwrap_or_else(|| CircuitBreakerOptions::new(name.clone()));
            registry.defaults.insert(name.clone(), base.merged(overrides));
        }
        registry
    }

    /// Fetch the breaker for `service_name`, creating it on first use.
    pub fn get_circuit_breaker(
        &self,
        service_name: &str,
        overrides: Option<&BreakerConfig>,
    ) -> Result<Arc<CircuitBreaker>, RegistryError> {
        if let Some(existing) = self.breakers.get(service_name) {
            return Ok(existing.clone());
        }

        let options = match (self.defaults.get(service_name), overrides) {
            (Some(defaults), Some(overrides)) => defaults.clone().merged(overrides),
            (Some(defaults), None) => defaults.clone(),
            (None, Some(overrides)) => CircuitBreakerOptions::new(service_name).merged(overrides),
            (None, None) => return Err(RegistryError::UnknownService(service_name.to_string())),
        };

        let mut created = false;
        let breaker = self
            .breakers
            .entry(service_name.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(CircuitBreaker::new(options))
            })
            .clone();

        if created {
            tracing::info!(
                service = %service_name,
                failure_threshold = breaker.options().failure_threshold,
                success_threshold = breaker.options().success_threshold,
                time_window = ?breaker.options().time_window,
                timeout = ?breaker.options().timeout,
                "Circuit breaker registered"
            );
            breaker.start_monitor();
        }

        Ok(breaker)
    }

    /// Breaker for a known service. Known services always have defaults.
    pub fn for_service(&self, service: Service) -> Result<Arc<CircuitBreaker>, RegistryError> {
        self.get_circuit_breaker(service.as_str(), None)
    }

    /// Already-registered breaker, without creating one.
    pub fn get(&self, service_name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(service_name).map(|entry| entry.clone())
    }

    /// Stats for every registered breaker, keyed by service name.
    pub fn get_all_stats(&self) -> BTreeMap<String, CircuitBreakerStats> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Stop every breaker's monitor and forget all breakers.
    pub fn destroy(&self) {
        for entry in self.breakers.iter() {
            entry.value().destroy();
        }
        let count = self.breakers.len();
        self.breakers.clear();
        tracing::info!(breakers = count, "Circuit breaker registry destroyed");
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
