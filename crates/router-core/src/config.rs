//! Configuration types for the AMM router

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::{is_valid_address, ChainId};

/// Chain connection and transaction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC URL (e.g., "http://127.0.0.1:8545")
    pub rpc_url: String,

    pub chain_id: ChainId,

    /// Swap router contract; execution is refused while unset
    #[serde(default)]
    pub router_address: Option<String>,

    /// Wrapped native token used in pool paths for the native currency
    #[serde(default)]
    pub wrapped_native: Option<String>,

    /// Account the node signs approvals and swaps for
    #[serde(default)]
    pub sender: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 1,
            router_address: None,
            wrapped_native: None,
            sender: None,
            request_timeout_secs: default_request_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
        }
    }
}

/// Runtime pool cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a refreshed snapshot is considered fresh
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,

    /// Pool contracts read on every refresh
    #[serde(default)]
    pub pool_addresses: Vec<String>,
}

fn default_freshness_secs() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness_secs(),
            pool_addresses: Vec::new(),
        }
    }
}

/// Swap defaults applied when a request leaves them out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u32,

    #[serde(default = "default_deadline_secs")]
    pub default_deadline_secs: u64,

    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    #[serde(default = "default_max_routes")]
    pub max_routes: usize,

    #[serde(default = "default_await_confirmation")]
    pub await_confirmation: bool,
}

fn default_slippage_bps() -> u32 {
    50
}

fn default_deadline_secs() -> u64 {
    300
}

fn default_max_hops() -> usize {
    3
}

fn default_max_routes() -> usize {
    5
}

fn default_await_confirmation() -> bool {
    true
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            default_slippage_bps: default_slippage_bps(),
            default_deadline_secs: default_deadline_secs(),
            max_hops: default_max_hops(),
            max_routes: default_max_routes(),
            await_confirmation: default_await_confirmation(),
        }
    }
}

/// Static token directory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

/// Static fallback pool entry (reserves as decimal strings)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub id: String,
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: String,
    pub reserve_b: String,
    pub fee_bps: u32,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub swap: SwapConfig,

    /// Interface the API binds to
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default)]
    pub tokens: Vec<TokenEntry>,

    #[serde(default)]
    pub fallback_pools: Vec<PoolEntry>,
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    19090
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            cache: CacheConfig::default(),
            swap: SwapConfig::default(),
            api_host: default_api_host(),
            api_port: default_api_port(),
            tokens: Vec::new(),
            fallback_pools: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_host.parse::<IpAddr>().is_err() {
            return Err(invalid("api_host", "must be an IP address"));
        }
        let optional_addresses = [
            ("chain.router_address", &self.chain.router_address),
            ("chain.wrapped_native", &self.chain.wrapped_native),
            ("chain.sender", &self.chain.sender),
        ];
        for (field, value) in optional_addresses {
            if let Some(addr) = value {
                check_address(field, addr)?;
            }
        }
        for addr in &self.cache.pool_addresses {
            check_address("cache.pool_addresses", addr)?;
        }
        for token in &self.tokens {
            check_address(&format!("tokens.{}", token.symbol), &token.address)?;
        }
        for pool in &self.fallback_pools {
            if pool.fee_bps >= 10_000 {
                return Err(invalid(
                    &format!("fallback_pools.{}.fee_bps", pool.id),
                    "must be below 10000",
                ));
            }
        }
        if self.chain.request_timeout_secs == 0 || self.chain.receipt_timeout_secs == 0 {
            return Err(invalid("chain timeouts", "must be non-zero"));
        }
        if self.swap.default_slippage_bps > 10_000 {
            return Err(invalid("swap.default_slippage_bps", "must be at most 10000"));
        }
        Ok(())
    }
}

fn check_address(field: &str, value: &str) -> Result<(), ConfigError> {
    if is_valid_address(value) {
        Ok(())
    } else {
        Err(invalid(field, &format!("'{}' is not a 0x-prefixed 20-byte address", value)))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.api_port, 19090);
        assert_eq!(config.api_host, "127.0.0.1");
        assert_eq!(config.cache.freshness_secs, 30);
        assert_eq!(config.swap.default_deadline_secs, 300);
        assert!(config.chain.router_address.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_matches_empty_file() {
        let parsed = AppConfig::from_toml_str("").unwrap();
        let default = AppConfig::default();
        assert_eq!(parsed.api_port, default.api_port);
        assert_eq!(parsed.api_host, default.api_host);
        assert_eq!(parsed.chain.rpc_url, default.chain.rpc_url);
        assert_eq!(parsed.swap.max_routes, default.swap.max_routes);
    }

    #[test]
    fn test_rejects_bad_api_host() {
        let config = AppConfig {
            api_host: "localhost:80".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            api_host = "0.0.0.0"
            api_port = 8080

            [chain]
            rpc_url = "http://node:8545"
            chain_id = 137
            router_address = "0x0000000000000000000000000000000000000aaa"

            [swap]
            max_hops = 2

            [[tokens]]
            symbol = "USDC"
            address = "0x0000000000000000000000000000000000000001"
            decimals = 6

            [[fallback_pools]]
            id = "0x0000000000000000000000000000000000000100"
            token_a = "0x0000000000000000000000000000000000000001"
            token_b = "0x0000000000000000000000000000000000000002"
            reserve_a = "1000000"
            reserve_b = "2000000"
            fee_bps = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.api_host, "0.0.0.0");
        assert_eq!(config.chain.chain_id, 137);
        assert_eq!(config.chain.request_timeout_secs, 30);
        assert_eq!(config.swap.max_hops, 2);
        assert_eq!(config.swap.max_routes, 5);
        assert_eq!(config.tokens.len(), 1);
        assert_eq!(config.fallback_pools[0].fee_bps, 30);
    }

    #[test]
    fn test_rejects_bad_fee() {
        let mut config = AppConfig::default();
        config.fallback_pools.push(PoolEntry {
            id: "p".into(),
            token_a: "a".into(),
            token_b: "b".into(),
            reserve_a: "1".into(),
            reserve_b: "1".into(),
            fee_bps: 10_000,
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_rejects_bad_router_address() {
        let mut config = AppConfig::default();
        config.chain.router_address = Some("router".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load("/nonexistent/amm-router.toml").unwrap();
        assert_eq!(config.api_port, 19090);
    }
}
