//! chain-client: Chain data source contract and JSON-RPC implementation
//!
//! The routing core only talks to the chain through [`ChainClient`] and
//! [`PoolSource`]; [`RpcClient`] implements both over an alloy HTTP provider
//! against an EVM-style node exposing a constant-product router.

pub mod contracts;
pub mod rpc;

use async_trait::async_trait;
use num_bigint::BigUint;
use router_core::{Address, ChainError, TxHash, UnixSeconds};
use serde::{Deserialize, Serialize};

pub use rpc::RpcClient;

/// Result type for chain client operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Reserves of a two-token pool as read from chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    #[serde(with = "router_core::amount::serde_decimal")]
    pub reserve0: BigUint,
    #[serde(with = "router_core::amount::serde_decimal")]
    pub reserve1: BigUint,
    pub fee_bps: u32,
}

/// Router entry point used for a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapMethod {
    /// ERC-20 in, ERC-20 out
    ExactTokensForTokens,
    /// Native currency in (sent as call value)
    ExactNativeForTokens,
    /// ERC-20 in, native currency out
    ExactTokensForNative,
}

/// A fully-specified swap submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapCall {
    pub router: Address,
    pub method: SwapMethod,
    #[serde(with = "router_core::amount::serde_decimal")]
    pub amount_in: BigUint,
    #[serde(with = "router_core::amount::serde_decimal")]
    pub min_out: BigUint,
    pub path: Vec<Address>,
    pub recipient: Address,
    pub deadline: UnixSeconds,
    #[serde(with = "router_core::amount::serde_decimal_opt")]
    pub max_fee_per_gas: Option<BigUint>,
    #[serde(with = "router_core::amount::serde_decimal_opt")]
    pub max_priority_fee_per_gas: Option<BigUint>,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// false when the transaction was mined but reverted
    pub success: bool,
}

/// Reads and writes the swap core needs from the chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn read_reserves(&self, pool: &Address) -> Result<PoolReserves>;

    /// Live two-or-more-token quote from the router contract
    async fn quote_amounts_out(
        &self,
        router: &Address,
        amount_in: &BigUint,
        path: &[Address],
    ) -> Result<BigUint>;

    async fn read_allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<BigUint>;

    async fn submit_approval(
        &self,
        token: &Address,
        spender: &Address,
        amount: &BigUint,
    ) -> Result<TxHash>;

    async fn submit_swap(&self, call: &SwapCall) -> Result<TxHash>;

    async fn await_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt>;

    async fn read_gas_price(&self) -> Result<BigUint>;
}

/// Full pool snapshot provider for registry refreshes
#[async_trait]
pub trait PoolSource: Send + Sync {
    async fn fetch_pool_snapshot(&self) -> Result<Vec<PoolReserves>>;
}
