//! Data Transfer Objects for API requests and responses

use amm::Pool;
use axum::{http::StatusCode, Json};
use router_core::{ChainId, SwapError};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chain_id: ChainId,
    /// Pools currently served (runtime set, else fallback)
    pub pools: usize,
    pub pools_fresh: bool,
    pub router_configured: bool,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }
}

/// Error half of every handler result
pub type ApiFailure = (StatusCode, Json<ApiError>);

/// Map a swap failure to its status and `{code, message}` body.
///
/// The cause chain is logged, never returned.
pub fn swap_failure(err: SwapError) -> ApiFailure {
    match &err.source {
        Some(cause) => tracing::warn!("{} (cause: {})", err, cause),
        None => tracing::debug!("{}", err),
    }
    let status =
        StatusCode::from_u16(err.kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::new(err.code(), err.message)))
}

/// Pool list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsResponse {
    pub pools: Vec<Pool>,
    pub count: usize,
}

/// Pool refresh request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Ignore the freshness window
    #[serde(default)]
    pub force: bool,
}
