//! HTTP server setup

use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Router with CORS and request tracing applied
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve the API on `addr` until Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let chain_id = state.context().chain_id;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API listening on {} (chain {})", listener.local_addr()?, chain_id);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
