//! AMM Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use amm::{Pool, QuoteRequest, QuoteResponse, SwapRequest, SwapResult};

use crate::dto::{swap_failure, ApiError, ApiFailure, PoolsResponse, RefreshRequest};
use crate::AppState;

/// Create AMM routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pools", get(get_pools))
        .route("/pools/refresh", post(refresh_pools))
        .route("/pools/:pool_id", get(get_pool))
        .route("/quote", post(get_quote))
        .route("/execute", post(execute_swap))
}

/// GET /amm/pools - Current pool set
async fn get_pools(State(state): State<AppState>) -> Json<PoolsResponse> {
    let pools = state.registry().list_pools().await;
    let count = pools.len();
    Json(PoolsResponse { pools, count })
}

/// GET /amm/pools/:pool_id - Get a specific pool
async fn get_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
) -> Result<Json<Pool>, ApiFailure> {
    state
        .registry()
        .get_pool_by_id(&pool_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!("Pool not found: {}", pool_id))),
            )
        })
}

/// POST /amm/pools/refresh - Reload pools from the chain
async fn refresh_pools(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<PoolsResponse>, ApiFailure> {
    let force = body.map(|Json(r)| r.force).unwrap_or(false);
    let source = state.pool_source().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(
                "pool_source_unavailable",
                "No live pool source configured",
            )),
        )
    })?;

    let pools = state
        .registry()
        .refresh_runtime_pools(source.as_ref(), force)
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::new("refresh_failed", e.to_string())),
            )
        })?;

    let pools = pools.as_ref().clone();
    let count = pools.len();
    Ok(Json(PoolsResponse { pools, count }))
}

/// POST /amm/quote - Price routes for a pair
async fn get_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiFailure> {
    amm::quote(state.context(), &request)
        .await
        .map(Json)
        .map_err(swap_failure)
}

/// POST /amm/execute - Simulate, approve if needed, and submit a swap
async fn execute_swap(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<SwapResult>, ApiFailure> {
    tracing::info!(
        "Execute {} {} -> {}",
        request.amount,
        request.token_in,
        request.token_out
    );
    state
        .executor()
        .execute(&request)
        .await
        .map(Json)
        .map_err(swap_failure)
}
