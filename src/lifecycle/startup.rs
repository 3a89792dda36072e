//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the circuit breaker registry from configuration
//! - Register breakers for every known and configured service
//! - Build one guard per known service
//!
//! # Design Decisions
//! - Configuration is already validated when it reaches `bootstrap`
//! - Must run inside a Tokio runtime for breaker monitors to start

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::GuardConfig;
use crate::resilience::guard::ServiceGuard;
use crate::resilience::policies::DomainPolicy;
use crate::resilience::registry::{CircuitBreakerRegistry, RegistryError};
use crate::services::Service;

/// Everything the process shares after startup.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub registry: Arc<CircuitBreakerRegistry>,
    pub guards: BTreeMap<Service, ServiceGuard>,
}

impl Runtime {
    pub fn guard(&self, service: Service) -> Option<&ServiceGuard> {
        self.guards.get(&service)
    }

    /// Stop every breaker monitor.
    pub fn shutdown(&self) {
        self.registry.destroy();
    }
}

pub fn bootstrap(config: &GuardConfig) -> Result<Runtime, RegistryError> {
    let registry = Arc::new(CircuitBreakerRegistry::from_config(config));

    let mut guards = BTreeMap::new();
    for service in Service::ALL {
        let guard = ServiceGuard::new(&registry, service)?
            .with_policy(DomainPolicy::from_config(service, config));
        guards.insert(service, guard);
    }

    // extra services named only in config
    for name in config.breakers.keys() {
        registry.get_circuit_breaker(name, None)?;
    }

    tracing::info!(
        breakers = registry.len(),
        guards = guards.len(),
        "Resilience layer initialized"
    );

    Ok(Runtime { registry, guards })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerConfig, RetryConfig};

    #[tokio::test]
    async fn test_bootstrap_registers_all_services() {
        let mut config = GuardConfig::default();
        config.breakers.insert("billing".into(), BreakerConfig::default());
        config.retries.insert(
            "chat".into(),
            RetryConfig {
                max_attempts: Some(5),
                ..Default::default()
            },
        );

        let runtime = bootstrap(&config).unwrap();
        assert_eq!(runtime.registry.len(), 5);
        assert_eq!(runtime.guards.len(), 4);
        assert_eq!(runtime.guard(Service::Chat).unwrap().policy().max_attempts, 5);
        assert!(runtime.registry.get("billing").is_some());
        assert!(runtime.registry.for_service(Service::Ai).unwrap().is_monitoring());

        runtime.shutdown();
        assert!(runtime.registry.is_empty());
    }
}
