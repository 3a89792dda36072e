use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::health::report::{BreakerHealth, HealthStatus};
use crate::http::server::AppState;
use crate::resilience::circuit_breaker::{CircuitBreakerStats, CircuitState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: HealthStatus,
    pub breakers: usize,
    pub open_circuits: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerDetail {
    pub service: String,
    pub success_count: u32,
    #[serde(flatten)]
    pub health: BreakerHealth,
}

impl BreakerDetail {
    fn new(service: String, stats: &CircuitBreakerStats) -> Self {
        Self {
            service,
            success_count: stats.success_count,
            health: BreakerHealth::from_stats(stats),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no circuit breaker registered for '{0}'")]
    UnknownBreaker(String),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::UnknownBreaker(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let stats = state.registry.get_all_stats();
    let open_circuits = stats
        .values()
        .filter(|s| s.state == CircuitState::Open)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if open_circuits == 0 {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        },
        breakers: stats.len(),
        open_circuits,
    })
}

pub async fn get_breakers(State(state): State<AppState>) -> Json<BTreeMap<String, BreakerDetail>> {
    let details = state
        .registry
        .get_all_stats()
        .into_iter()
        .map(|(name, stats)| (name.clone(), BreakerDetail::new(name, &stats)))
        .collect();
    Json(details)
}

pub async fn force_open(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Result<Json<BreakerDetail>, AdminError> {
    let breaker = state
        .registry
        .get(&service)
        .ok_or_else(|| AdminError::UnknownBreaker(service.clone()))?;

    breaker.force_open();
    tracing::warn!(service = %service, "Circuit forced open via admin API");
    Ok(Json(BreakerDetail::new(service, &breaker.stats())))
}

pub async fn force_close(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Result<Json<BreakerDetail>, AdminError> {
    let breaker = state
        .registry
        .get(&service)
        .ok_or_else(|| AdminError::UnknownBreaker(service.clone()))?;

    breaker.force_closed();
    tracing::info!(service = %service, "Circuit forced closed via admin API");
    Ok(Json(BreakerDetail::new(service, &breaker.stats())))
}
