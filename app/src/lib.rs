//! amm-router service library
//!
//! Loads configuration, wires the chain client, pool registry, and swap
//! executor together, and serves the HTTP API.

pub mod refresher;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use amm::{PoolRegistry, StaticTokenDirectory, SwapContext, SwapExecutor};
use anyhow::Context;
use chain_client::{PoolSource, RpcClient};
use router_api::AppState;
use router_core::{Address, AppConfig};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV: &str = "AMM_ROUTER_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "amm-router.toml";

pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("amm_router=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

/// Config path from the environment, else the default
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = config_path();
    AppConfig::load(&path).with_context(|| format!("Failed to load config from {}", path))
}

/// Build the shared API state from configuration
pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let registry = Arc::new(
        PoolRegistry::from_config(config).context("Invalid fallback pool in config")?,
    );
    let tokens = Arc::new(StaticTokenDirectory::from_entries(
        config.chain.chain_id,
        &config.tokens,
    ));
    let rpc = Arc::new(
        RpcClient::new(&config.chain, &config.cache.pool_addresses)
            .context("Failed to create RPC client")?,
    );

    let ctx = SwapContext::new(registry, tokens, config);
    let executor = SwapExecutor::new(
        ctx,
        rpc.clone(),
        config.chain.router_address.as_deref().map(Address::new),
        config.chain.sender.as_deref().map(Address::new),
    );

    let pool_source: Option<Arc<dyn PoolSource>> = if config.cache.pool_addresses.is_empty() {
        None
    } else {
        Some(rpc)
    };

    Ok(AppState::new(executor, pool_source))
}

/// Run the service until the server stops
pub async fn run() -> anyhow::Result<()> {
    init_tracing()?;

    let config = load_config()?;
    tracing::info!(
        "Starting amm-router (chain {} via {})",
        config.chain.chain_id,
        config.chain.rpc_url
    );
    if config.chain.router_address.is_none() {
        tracing::warn!("No router_address configured; execute requests will be rejected");
    }

    let state = build_state(&config)?;
    match state.pool_source() {
        Some(source) => {
            let interval = Duration::from_secs(config.cache.freshness_secs.max(1));
            refresher::spawn_pool_refresher(
                state.context().registry.clone(),
                source.clone(),
                interval,
            );
        }
        None => tracing::info!(
            "No pool addresses configured; serving {} fallback pools",
            config.fallback_pools.len()
        ),
    }

    router_api::start_server(state, bind_address(&config)?)
        .await
        .context("API server failed")
}

/// Socket the API listens on
pub fn bind_address(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    let host: IpAddr = config
        .api_host
        .parse()
        .with_context(|| format!("Invalid api_host {}", config.api_host))?;
    Ok(SocketAddr::new(host, config.api_port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_without_pool_addresses() {
        let config = AppConfig::default();
        let state = build_state(&config).unwrap();
        assert!(state.pool_source().is_none());
    }

    #[test]
    fn test_bind_address_uses_config() {
        let addr = bind_address(&AppConfig::default()).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:19090");

        let config = AppConfig {
            api_host: "0.0.0.0".into(),
            api_port: 8080,
            ..AppConfig::default()
        };
        assert_eq!(bind_address(&config).unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_build_state_with_pool_addresses() {
        let mut config = AppConfig::default();
        config
            .cache
            .pool_addresses
            .push("0x00000000000000000000000000000000000000a1".to_string());
        let state = build_state(&config).unwrap();
        assert!(state.pool_source().is_some());
    }

    #[test]
    fn test_build_state_rejects_bad_fallback_pool() {
        let config = AppConfig::from_toml_str(
            r#"
[[fallback_pools]]
id = "0x00000000000000000000000000000000000000a1"
token_a = "0x0000000000000000000000000000000000000001"
token_b = "0x0000000000000000000000000000000000000001"
reserve_a = "1"
reserve_b = "1"
fee_bps = 30
"#,
        )
        .unwrap();
        assert!(build_state(&config).is_err());
    }
}
