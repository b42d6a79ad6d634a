//! Request-independent collaborators shared by quoting and execution.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::{parse_units, Address, AppConfig, ChainId, ErrorKind, SwapConfig, SwapError};

use crate::registry::PoolRegistry;
use crate::state::Token;
use crate::tokens::TokenDirectory;

#[derive(Clone)]
pub struct SwapContext {
    pub registry: Arc<PoolRegistry>,
    pub tokens: Arc<dyn TokenDirectory>,
    pub chain_id: ChainId,
    /// Wrapped form of the native currency, used in pool paths
    pub wrapped_native: Option<Address>,
    pub defaults: SwapConfig,
}

impl SwapContext {
    pub fn new(
        registry: Arc<PoolRegistry>,
        tokens: Arc<dyn TokenDirectory>,
        config: &AppConfig,
    ) -> Self {
        Self {
            registry,
            tokens,
            chain_id: config.chain.chain_id,
            wrapped_native: config.chain.wrapped_native.as_deref().map(Address::new),
            defaults: config.swap.clone(),
        }
    }

    pub fn resolve_token(&self, symbol: &str) -> Result<Token, SwapError> {
        self.tokens.resolve(symbol, self.chain_id).ok_or_else(|| {
            SwapError::new(
                ErrorKind::UnsupportedToken,
                format!("Token '{}' is not supported on chain {}", symbol, self.chain_id),
            )
        })
    }

    /// Address the token trades under inside pools
    pub fn routing_address(&self, token: &Token) -> Result<Address, SwapError> {
        token
            .routing_address(self.wrapped_native.as_ref())
            .ok_or_else(|| {
                SwapError::new(
                    ErrorKind::UnsupportedToken,
                    format!("{} has no wrapped token configured", token.symbol),
                )
            })
    }

    /// Human amount → base units, rejecting zero
    pub fn parse_amount(&self, token: &Token, amount: &str) -> Result<BigUint, SwapError> {
        let value = parse_units(amount, token.decimals).map_err(|e| {
            SwapError::wrap(
                ErrorKind::InvalidAmount,
                format!("Invalid {} amount '{}'", token.symbol, amount),
                e,
            )
        })?;
        if value.is_zero() {
            return Err(SwapError::new(
                ErrorKind::InvalidAmount,
                "Amount must be greater than zero",
            ));
        }
        Ok(value)
    }

    pub fn slippage_bps(&self, requested: Option<u32>) -> Result<u32, SwapError> {
        let bps = requested.unwrap_or(self.defaults.default_slippage_bps);
        if bps > router_core::BPS_DENOMINATOR {
            return Err(SwapError::new(
                ErrorKind::InvalidAmount,
                format!("Slippage {} bps exceeds 10000", bps),
            ));
        }
        Ok(bps)
    }
}

impl std::fmt::Debug for SwapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapContext")
            .field("chain_id", &self.chain_id)
            .field("wrapped_native", &self.wrapped_native)
            .finish_non_exhaustive()
    }
}
