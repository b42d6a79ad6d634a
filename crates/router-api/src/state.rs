//! Application state shared across API handlers

use std::sync::Arc;

use amm::{PoolRegistry, SwapContext, SwapExecutor};
use chain_client::PoolSource;

/// Cheaply cloneable handle to the swap services
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    executor: SwapExecutor,
    /// Live pool source for refreshes; `None` serves fallback pools only
    pool_source: Option<Arc<dyn PoolSource>>,
}

impl AppState {
    pub fn new(executor: SwapExecutor, pool_source: Option<Arc<dyn PoolSource>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                executor,
                pool_source,
            }),
        }
    }

    pub fn executor(&self) -> &SwapExecutor {
        &self.inner.executor
    }

    pub fn context(&self) -> &SwapContext {
        self.inner.executor.context()
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.context().registry
    }

    pub fn pool_source(&self) -> Option<&Arc<dyn PoolSource>> {
        self.inner.pool_source.as_ref()
    }
}
