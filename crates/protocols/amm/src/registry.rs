//! Pool Registry & Cache
//!
//! Holds the static fallback pools plus a runtime set refreshed from a chain
//! source. Reads return the runtime set when it is non-empty.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chain_client::PoolSource;
use router_core::{AppConfig, Address, ChainError};
use tokio::sync::{Mutex, RwLock};

use crate::router;
use crate::state::{Pool, PoolError};

#[derive(Debug, Default)]
struct RuntimePools {
    pools: Arc<Vec<Pool>>,
    refreshed_at: Option<Instant>,
}

/// Shared pool registry. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct PoolRegistry {
    fallback: Arc<Vec<Pool>>,
    runtime: RwLock<RuntimePools>,
    /// Serializes refreshes so concurrent triggers perform one fetch
    refresh_lock: Mutex<()>,
    freshness: Duration,
}

impl PoolRegistry {
    pub fn new(fallback: Vec<Pool>, freshness: Duration) -> Self {
        Self {
            fallback: Arc::new(fallback),
            runtime: RwLock::new(RuntimePools::default()),
            refresh_lock: Mutex::new(()),
            freshness,
        }
    }

    /// Seed the fallback set from `fallback_pools` in config
    pub fn from_config(config: &AppConfig) -> Result<Self, PoolError> {
        let fallback = config
            .fallback_pools
            .iter()
            .map(Pool::from_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            fallback,
            Duration::from_secs(config.cache.freshness_secs),
        ))
    }

    /// Current pool set for one request; runtime if non-empty, else fallback.
    pub async fn snapshot(&self) -> Arc<Vec<Pool>> {
        let runtime = self.runtime.read().await;
        if runtime.pools.is_empty() {
            Arc::clone(&self.fallback)
        } else {
            Arc::clone(&runtime.pools)
        }
    }

    pub async fn list_pools(&self) -> Vec<Pool> {
        self.snapshot().await.as_ref().clone()
    }

    pub async fn get_pool_by_id(&self, id: &str) -> Option<Pool> {
        let id = router_core::normalize_address(id);
        self.snapshot().await.iter().find(|p| p.id == id).cloned()
    }

    /// First pool holding exactly the pair `a`/`b`
    pub async fn find_direct_pool(&self, a: &Address, b: &Address) -> Option<Pool> {
        let pools = self.snapshot().await;
        router::find_direct_pool(&pools, a, b).cloned()
    }

    /// Replace the runtime set wholesale
    pub async fn set_runtime_pools(&self, pools: Vec<Pool>) {
        let mut runtime = self.runtime.write().await;
        runtime.pools = Arc::new(pools);
        runtime.refreshed_at = Some(Instant::now());
    }

    /// True while the last refresh is inside the freshness window
    pub async fn is_fresh(&self) -> bool {
        self.runtime
            .read()
            .await
            .refreshed_at
            .is_some_and(|at| at.elapsed() < self.freshness)
    }

    /// Fetch a snapshot from `source` and replace the runtime set.
    ///
    /// Skipped while fresh unless `force`. Pools with a zero reserve or an
    /// invalid shape are dropped. On failure the previous runtime set is kept.
    pub async fn refresh_runtime_pools(
        &self,
        source: &dyn PoolSource,
        force: bool,
    ) -> Result<Arc<Vec<Pool>>, ChainError> {
        if !force && self.is_fresh().await {
            return Ok(self.snapshot().await);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited
        if !force && self.is_fresh().await {
            return Ok(self.snapshot().await);
        }

        let fetched = match source.fetch_pool_snapshot().await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Pool refresh failed, keeping previous pools: {}", e);
                return Err(e);
            }
        };

        let total = fetched.len();
        let pools: Vec<Pool> = fetched
            .iter()
            .filter_map(|reserves| match Pool::from_reserves(reserves) {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!("Skipping pool {}: {}", reserves.pool, e);
                    None
                }
            })
            .filter(Pool::has_liquidity)
            .collect();

        tracing::info!(
            "Refreshed pool registry: {} usable of {} fetched",
            pools.len(),
            total
        );
        self.set_runtime_pools(pools).await;
        Ok(self.snapshot().await)
    }
}
