//! Liveness and readiness summary

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health - Service status with chain and pool summary
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.registry();
    let pools = registry.snapshot().await.len();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.context().chain_id,
        pools,
        pools_fresh: registry.is_fresh().await,
        router_configured: state.executor().router_address().is_some(),
    })
}
