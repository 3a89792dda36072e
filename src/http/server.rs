//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with health and admin handlers
//! - Wire up middleware (tracing, request timeout)
//! - Bind server to listener and drain on shutdown

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::GuardConfig;
use crate::health::report::{breaker_health, BreakerHealth, HealthReport};
use crate::resilience::registry::CircuitBreakerRegistry;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<CircuitBreakerRegistry>,
    pub config: Arc<GuardConfig>,
}

/// HTTP server for the health and admin surface.
pub struct HttpServer {
    router: Router,
    config: Arc<GuardConfig>,
}

impl HttpServer {
    pub fn new(config: GuardConfig, registry: Arc<CircuitBreakerRegistry>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            registry,
            config: config.clone(),
        };

        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.config.listener.request_timeout_secs);

        let mut router = Router::new()
            .route("/health", get(health))
            .route("/health/circuit-breakers", get(circuit_breakers));

        if state.config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state.clone()));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// Router clone, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<S>(self, listener: TcpListener, shutdown: S) -> Result<(), std::io::Error>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin_enabled = self.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::from_registry(&state.registry))
}

async fn circuit_breakers(State(state): State<AppState>) -> Json<BTreeMap<String, BreakerHealth>> {
    Json(breaker_health(&state.registry))
}
