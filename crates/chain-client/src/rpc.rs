//! JSON-RPC client for an EVM-style node
//!
//! Transactions are submitted with `eth_sendTransaction`, so the node (or the
//! signer in front of it) owns the sender key.

use std::future::IntoFuture;
use std::time::{Duration, Instant};

use alloy::network::ReceiptResponse as _;
use alloy::primitives::{Address as EvmAddress, Bytes, TxHash as EvmTxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::transports::http::reqwest::Url;
use alloy::transports::{TransportError, TransportResult};
use async_trait::async_trait;
use num_bigint::BigUint;
use router_core::{Address, ChainConfig, ChainError, TxHash};

use crate::contracts;
use crate::{ChainClient, PoolReserves, PoolSource, Result, SwapCall, TxReceipt};

/// Fee applied to pools read from chain; constant-product pairs do not expose it.
pub const DEFAULT_POOL_FEE_BPS: u32 = 30;

/// High-level JSON-RPC client
pub struct RpcClient {
    provider: DynProvider,
    url: String,
    sender: Option<EvmAddress>,
    request_timeout: Duration,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
    pool_addresses: Vec<Address>,
}

impl RpcClient {
    pub fn new(config: &ChainConfig, pool_addresses: &[String]) -> Result<Self> {
        let url: Url = config.rpc_url.parse().map_err(|e| ChainError::Unreachable {
            url: config.rpc_url.clone(),
            message: format!("invalid RPC url: {}", e),
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        let sender = config
            .sender
            .as_deref()
            .map(|s| contracts::to_evm_address(&Address::new(s)))
            .transpose()?;

        Ok(Self {
            provider,
            url: config.rpc_url.clone(),
            sender,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            receipt_poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
            pool_addresses: pool_addresses.iter().map(Address::new).collect(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Await one provider request, bounded by the request timeout
    async fn timed<F, T>(&self, method: &'static str, request: F) -> Result<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        tracing::debug!(method, "rpc request");
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result.map_err(|e| self.transport_error(e)),
            Err(_) => Err(ChainError::Timeout {
                secs: self.request_timeout.as_secs(),
            }),
        }
    }

    fn transport_error(&self, error: TransportError) -> ChainError {
        if let Some(payload) = error.as_error_resp() {
            return rpc_error(payload.code, &payload.message, payload.as_revert_data());
        }
        if error.is_transport_error() {
            ChainError::Unreachable {
                url: self.url.clone(),
                message: error.to_string(),
            }
        } else {
            ChainError::ParseError(error.to_string())
        }
    }

    async fn eth_call(&self, to: &Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .to(contracts::to_evm_address(to)?)
            .input(TransactionInput::new(data));
        self.timed("eth_call", self.provider.call(tx)).await
    }

    async fn send_transaction(
        &self,
        to: &Address,
        data: Bytes,
        value: Option<U256>,
        max_fee_per_gas: Option<&BigUint>,
        max_priority_fee_per_gas: Option<&BigUint>,
    ) -> Result<TxHash> {
        let from = self.sender.ok_or_else(|| ChainError::Rpc {
            code: -32000,
            message: "no sender account configured".to_string(),
            revert_reason: None,
        })?;

        let mut tx = TransactionRequest::default()
            .from(from)
            .to(contracts::to_evm_address(to)?)
            .input(TransactionInput::new(data));
        if let Some(v) = value {
            tx = tx.value(v);
        }
        if let Some(fee) = max_fee_per_gas {
            tx = tx.max_fee_per_gas(contracts::to_gas_u128(fee)?);
        }
        if let Some(tip) = max_priority_fee_per_gas {
            tx = tx.max_priority_fee_per_gas(contracts::to_gas_u128(tip)?);
        }

        let pending = self
            .timed("eth_sendTransaction", self.provider.send_transaction(tx))
            .await?;
        Ok(TxHash::from(*pending.tx_hash()))
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn read_reserves(&self, pool: &Address) -> Result<PoolReserves> {
        let (reserves, token0, token1) = tokio::try_join!(
            self.eth_call(pool, contracts::encode_get_reserves()),
            self.eth_call(pool, contracts::encode_token0()),
            self.eth_call(pool, contracts::encode_token1()),
        )?;
        let (reserve0, reserve1) = contracts::decode_reserves(&reserves)?;

        Ok(PoolReserves {
            pool: pool.clone(),
            token0: contracts::decode_token(&token0)?,
            token1: contracts::decode_token(&token1)?,
            reserve0,
            reserve1,
            fee_bps: DEFAULT_POOL_FEE_BPS,
        })
    }

    async fn quote_amounts_out(
        &self,
        router: &Address,
        amount_in: &BigUint,
        path: &[Address],
    ) -> Result<BigUint> {
        let data = contracts::encode_amounts_out(amount_in, path)?;
        contracts::decode_amounts_out(&self.eth_call(router, data).await?)
    }

    async fn read_allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<BigUint> {
        let data = contracts::encode_allowance(owner, spender)?;
        contracts::decode_allowance(&self.eth_call(token, data).await?)
    }

    async fn submit_approval(
        &self,
        token: &Address,
        spender: &Address,
        amount: &BigUint,
    ) -> Result<TxHash> {
        let data = contracts::encode_approve(spender, amount)?;
        let tx_hash = self.send_transaction(token, data, None, None, None).await?;
        tracing::info!(%tx_hash, %token, %spender, "approval submitted");
        Ok(tx_hash)
    }

    async fn submit_swap(&self, call: &SwapCall) -> Result<TxHash> {
        let (data, value) = contracts::encode_swap(call)?;
        let tx_hash = self
            .send_transaction(
                &call.router,
                data,
                value,
                call.max_fee_per_gas.as_ref(),
                call.max_priority_fee_per_gas.as_ref(),
            )
            .await?;
        tracing::info!(%tx_hash, method = ?call.method, hops = call.path.len().saturating_sub(1), "swap submitted");
        Ok(tx_hash)
    }

    async fn await_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt> {
        let hash: EvmTxHash = tx_hash
            .as_str()
            .parse()
            .map_err(|e| ChainError::ParseError(format!("bad tx hash {}: {}", tx_hash, e)))?;

        let started = Instant::now();
        loop {
            let receipt = self
                .timed(
                    "eth_getTransactionReceipt",
                    self.provider.get_transaction_receipt(hash),
                )
                .await?;

            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash: TxHash::from(receipt.transaction_hash),
                    block_number: receipt.block_number.unwrap_or(0),
                    success: receipt.status(),
                });
            }

            if started.elapsed() >= self.receipt_timeout {
                return Err(ChainError::ReceiptTimeout {
                    tx_hash: tx_hash.to_string(),
                    secs: self.receipt_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    async fn read_gas_price(&self) -> Result<BigUint> {
        let price = self
            .timed("eth_gasPrice", self.provider.get_gas_price())
            .await?;
        Ok(BigUint::from(price))
    }
}

#[async_trait]
impl PoolSource for RpcClient {
    async fn fetch_pool_snapshot(&self) -> Result<Vec<PoolReserves>> {
        let mut pools = Vec::with_capacity(self.pool_addresses.len());
        for pool in &self.pool_addresses {
            pools.push(self.read_reserves(pool).await?);
        }
        tracing::debug!(count = pools.len(), "pool snapshot fetched");
        Ok(pools)
    }
}

/// Map a JSON-RPC error response, decoding any attached revert data
fn rpc_error(code: i64, message: &str, revert_data: Option<Bytes>) -> ChainError {
    ChainError::Rpc {
        code,
        message: message.to_string(),
        revert_reason: revert_data.and_then(|data| contracts::revert_reason(&data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{Revert, SolError};

    #[test]
    fn test_rpc_error_decodes_revert() {
        let data = Revert {
            reason: "hello".to_string(),
        }
        .abi_encode();
        match rpc_error(3, "execution reverted", Some(data.into())) {
            ChainError::Rpc {
                code,
                revert_reason,
                ..
            } => {
                assert_eq!(code, 3);
                assert_eq!(revert_reason.as_deref(), Some("hello"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_rpc_error_with_hostile_revert_data() {
        let mut data = Revert::SELECTOR.to_vec();
        data.extend(U256::MAX.to_be_bytes::<32>());
        let err = rpc_error(3, "execution reverted", Some(data.into()));
        assert!(matches!(
            err,
            ChainError::Rpc {
                revert_reason: None,
                ..
            }
        ));
        // the node's message still classifies
        assert_eq!(err.revert_reason(), Some("execution reverted"));
    }

    #[test]
    fn test_client_from_config() {
        let config = ChainConfig {
            sender: Some("0x00000000000000000000000000000000000000AA".into()),
            ..ChainConfig::default()
        };
        let client = RpcClient::new(&config, &["0x0000000000000000000000000000000000000001".into()])
            .unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:8545");
        assert_eq!(client.pool_addresses.len(), 1);
        assert_eq!(
            client.sender.map(|a| Address::from(a).to_string()),
            Some("0x00000000000000000000000000000000000000aa".to_string())
        );
    }

    #[test]
    fn test_client_rejects_bad_url_or_sender() {
        let bad_url = ChainConfig {
            rpc_url: "not a url".into(),
            ..ChainConfig::default()
        };
        assert!(RpcClient::new(&bad_url, &[]).is_err());

        let bad_sender = ChainConfig {
            sender: Some("0x01".into()),
            ..ChainConfig::default()
        };
        assert!(RpcClient::new(&bad_sender, &[]).is_err());
    }
}
