//! AMM State Types
//!
//! Data structures for tokens, pools, routes, and quotes.

use std::fmt;

use chain_client::PoolReserves;
use num_bigint::BigUint;
use num_traits::Zero;
use router_core::amount::serde_decimal;
use router_core::{normalize_address, Address, PoolEntry, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolved token descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    /// Contract address, or the native-currency sentinel
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(symbol: impl Into<String>, address: impl AsRef<str>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address: Address::new(address),
            decimals,
        }
    }

    pub fn is_native(&self) -> bool {
        self.address.is_native()
    }

    /// Address used for this token inside pool paths.
    ///
    /// The native currency trades through its wrapped form; `None` when no
    /// wrapped token is known.
    pub fn routing_address(&self, wrapped_native: Option<&Address>) -> Option<Address> {
        if self.is_native() {
            wrapped_native.cloned()
        } else {
            Some(self.address.clone())
        }
    }
}

/// Pool pricing model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolKind {
    /// x * y = k
    ConstantProduct,
}

/// Pool construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Pool {pool_id}: fee {fee_bps} bps must be below 10000")]
    FeeOutOfRange { pool_id: String, fee_bps: u32 },

    #[error("Pool {0}: both sides hold the same token")]
    IdenticalTokens(String),

    #[error("Pool {pool_id}: invalid reserve '{value}'")]
    InvalidReserve { pool_id: String, value: String },
}

/// Two-token liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Pool identity (pool contract address, lowercase)
    pub id: String,
    pub token_a: Address,
    pub token_b: Address,
    #[serde(with = "serde_decimal")]
    pub reserve_a: BigUint,
    #[serde(with = "serde_decimal")]
    pub reserve_b: BigUint,
    /// Swap fee in basis points, below 10000
    pub fee_bps: u32,
    pub kind: PoolKind,
}

impl Pool {
    pub fn new(
        id: impl AsRef<str>,
        token_a: impl AsRef<str>,
        token_b: impl AsRef<str>,
        reserve_a: BigUint,
        reserve_b: BigUint,
        fee_bps: u32,
    ) -> Result<Self, PoolError> {
        let id = normalize_address(id.as_ref());
        if fee_bps >= BPS_DENOMINATOR {
            return Err(PoolError::FeeOutOfRange {
                pool_id: id,
                fee_bps,
            });
        }
        let token_a = Address::new(token_a);
        let token_b = Address::new(token_b);
        if token_a == token_b {
            return Err(PoolError::IdenticalTokens(id));
        }

        Ok(Self {
            id,
            token_a,
            token_b,
            reserve_a,
            reserve_b,
            fee_bps,
            kind: PoolKind::ConstantProduct,
        })
    }

    /// Build from a static configuration entry
    pub fn from_entry(entry: &PoolEntry) -> Result<Self, PoolError> {
        let parse = |value: &str| {
            BigUint::parse_bytes(value.trim().as_bytes(), 10).ok_or_else(|| {
                PoolError::InvalidReserve {
                    pool_id: entry.id.clone(),
                    value: value.to_string(),
                }
            })
        };
        Self::new(
            &entry.id,
            &entry.token_a,
            &entry.token_b,
            parse(&entry.reserve_a)?,
            parse(&entry.reserve_b)?,
            entry.fee_bps,
        )
    }

    /// Build from reserves read on chain
    pub fn from_reserves(reserves: &PoolReserves) -> Result<Self, PoolError> {
        Self::new(
            reserves.pool.as_str(),
            reserves.token0.as_str(),
            reserves.token1.as_str(),
            reserves.reserve0.clone(),
            reserves.reserve1.clone(),
            reserves.fee_bps,
        )
    }

    pub fn touches(&self, token: &Address) -> bool {
        &self.token_a == token || &self.token_b == token
    }

    /// The token on the opposite side of `token`, if the pool holds it
    pub fn other_token(&self, token: &Address) -> Option<&Address> {
        if &self.token_a == token {
            Some(&self.token_b)
        } else if &self.token_b == token {
            Some(&self.token_a)
        } else {
            None
        }
    }

    /// `(reserve_in, reserve_out)` when swapping `token_in` through this pool
    pub fn reserves_for(&self, token_in: &Address) -> Option<(&BigUint, &BigUint)> {
        if &self.token_a == token_in {
            Some((&self.reserve_a, &self.reserve_b))
        } else if &self.token_b == token_in {
            Some((&self.reserve_b, &self.reserve_a))
        } else {
            None
        }
    }

    /// Both reserves non-zero
    pub fn has_liquidity(&self) -> bool {
        !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool {} | {}: {} | {}: {} | fee {}bps",
            short(&self.id),
            short(self.token_a.as_str()),
            self.reserve_a,
            short(self.token_b.as_str()),
            self.reserve_b,
            self.fee_bps
        )
    }
}

fn short(id: &str) -> &str {
    &id[..10.min(id.len())]
}

/// Ordered pools plus the tokens they traverse (`tokens.len() == pools.len() + 1`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub pools: Vec<Pool>,
    pub tokens: Vec<Address>,
}

impl Route {
    pub fn hops(&self) -> usize {
        self.pools.len()
    }

    pub fn token_in(&self) -> Option<&Address> {
        self.tokens.first()
    }

    pub fn token_out(&self) -> Option<&Address> {
        self.tokens.last()
    }

    pub fn pool_ids(&self) -> Vec<String> {
        self.pools.iter().map(|p| p.id.clone()).collect()
    }

    pub fn kind(&self) -> RouteKind {
        if self.pools.len() == 1 {
            RouteKind::Direct
        } else {
            RouteKind::MultiHop
        }
    }
}

/// Route shape tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteKind {
    Direct,
    MultiHop,
}

/// A priced route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub route: Route,
    #[serde(with = "serde_decimal")]
    pub amount_in: BigUint,
    #[serde(with = "serde_decimal")]
    pub amount_out: BigUint,
    /// Summed per-hop impact; `None` when any hop's impact is unknown
    pub price_impact_bps: Option<u32>,
    pub kind: RouteKind,
}
