//! Background pool refresher
//!
//! Periodically reloads pool reserves from the chain into the registry. A
//! failed pass keeps serving the previous pools and retries next interval.

use std::sync::Arc;
use std::time::Duration;

use amm::PoolRegistry;
use chain_client::PoolSource;
use tokio::task::JoinHandle;

pub fn spawn_pool_refresher(
    registry: Arc<PoolRegistry>,
    source: Arc<dyn PoolSource>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match registry.refresh_runtime_pools(source.as_ref(), false).await {
                Ok(pools) => tracing::debug!("Pool refresher pass: {} pools", pools.len()),
                Err(e) => tracing::warn!("Pool refresher pass failed: {}", e),
            }
            tokio::time::sleep(interval).await;
        }
    })
}
