//! Administrative endpoints: inspect and force breaker state.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Admin routes behind bearer-token auth. State is supplied by the caller.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/circuit-breakers", get(get_breakers))
        .route("/admin/circuit-breakers/{service}/open", post(force_open))
        .route("/admin/circuit-breakers/{service}/close", post(force_close))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
