//! Quote → handle → execute, driven from a TOML config.

use std::sync::{Arc, Mutex};

use amm::{
    quote, PoolRegistry, QuoteRequest, QuoteSource, StaticTokenDirectory, SwapContext,
    SwapExecutor, SwapRequest,
};
use async_trait::async_trait;
use chain_client::{ChainClient, PoolReserves, PoolSource, SwapCall, TxReceipt};
use num_bigint::BigUint;
use router_core::{Address, AppConfig, ChainError, TxHash};

const CONFIG: &str = r#"
api_port = 19091

[chain]
rpc_url = "http://127.0.0.1:8545"
chain_id = 31337
router_address = "0x00000000000000000000000000000000000000c8"
wrapped_native = "0x0000000000000000000000000000000000000009"
sender = "0x00000000000000000000000000000000000000c9"

[swap]
default_slippage_bps = 100

[[tokens]]
symbol = "USDC"
address = "0x0000000000000000000000000000000000000001"
decimals = 6

[[tokens]]
symbol = "DAI"
address = "0x0000000000000000000000000000000000000002"
decimals = 18

[[tokens]]
symbol = "ETH"
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
decimals = 18

[[fallback_pools]]
id = "0x00000000000000000000000000000000000000a1"
token_a = "0x0000000000000000000000000000000000000001"
token_b = "0x0000000000000000000000000000000000000009"
reserve_a = "2500000000000"
reserve_b = "1000000000000000000000"
fee_bps = 30

[[fallback_pools]]
id = "0x00000000000000000000000000000000000000a2"
token_a = "0x0000000000000000000000000000000000000009"
token_b = "0x0000000000000000000000000000000000000002"
reserve_a = "1000000000000000000000"
reserve_b = "2500000000000000000000000"
fee_bps = 30
"#;

#[derive(Default)]
struct RecordingChain {
    swaps: Mutex<Vec<SwapCall>>,
    approvals: Mutex<usize>,
}

#[async_trait]
impl ChainClient for RecordingChain {
    async fn read_reserves(&self, pool: &Address) -> chain_client::Result<PoolReserves> {
        Err(ChainError::ParseError(format!("unknown pool {}", pool)))
    }

    async fn quote_amounts_out(
        &self,
        _router: &Address,
        _amount_in: &BigUint,
        _path: &[Address],
    ) -> chain_client::Result<BigUint> {
        Err(ChainError::Timeout { secs: 1 })
    }

    async fn read_allowance(
        &self,
        _token: &Address,
        _owner: &Address,
        _spender: &Address,
    ) -> chain_client::Result<BigUint> {
        // Approved once, approved forever
        let approved = *self.approvals.lock().unwrap() > 0;
        Ok(if approved {
            BigUint::from(u128::MAX)
        } else {
            BigUint::from(0u32)
        })
    }

    async fn submit_approval(
        &self,
        _token: &Address,
        _spender: &Address,
        _amount: &BigUint,
    ) -> chain_client::Result<TxHash> {
        *self.approvals.lock().unwrap() += 1;
        Ok(TxHash::new("0xapprove"))
    }

    async fn submit_swap(&self, call: &SwapCall) -> chain_client::Result<TxHash> {
        self.swaps.lock().unwrap().push(call.clone());
        Ok(TxHash::new("0xswap"))
    }

    async fn await_receipt(&self, tx_hash: &TxHash) -> chain_client::Result<TxReceipt> {
        Ok(TxReceipt {
            tx_hash: tx_hash.clone(),
            block_number: 100,
            success: true,
        })
    }

    async fn read_gas_price(&self) -> chain_client::Result<BigUint> {
        Ok(BigUint::from(1_000_000_000u64))
    }
}

/// Serves the fallback pools with DAI liquidity halved
struct ShallowerSource;

#[async_trait]
impl PoolSource for ShallowerSource {
    async fn fetch_pool_snapshot(&self) -> chain_client::Result<Vec<PoolReserves>> {
        let addr = |s: &str| Address::new(s);
        Ok(vec![
            PoolReserves {
                pool: addr("0x00000000000000000000000000000000000000a1"),
                token0: addr("0x0000000000000000000000000000000000000001"),
                token1: addr("0x0000000000000000000000000000000000000009"),
                reserve0: BigUint::from(2_500_000_000_000u64),
                reserve1: BigUint::parse_bytes(b"1000000000000000000000", 10).unwrap(),
                fee_bps: 30,
            },
            PoolReserves {
                pool: addr("0x00000000000000000000000000000000000000a2"),
                token0: addr("0x0000000000000000000000000000000000000009"),
                token1: addr("0x0000000000000000000000000000000000000002"),
                reserve0: BigUint::parse_bytes(b"1000000000000000000000", 10).unwrap(),
                reserve1: BigUint::parse_bytes(b"1250000000000000000000000", 10).unwrap(),
                fee_bps: 30,
            },
        ])
    }
}

fn build(config: &AppConfig, chain: Arc<RecordingChain>) -> SwapExecutor {
    let registry = Arc::new(PoolRegistry::from_config(config).unwrap());
    let tokens = Arc::new(StaticTokenDirectory::from_entries(
        config.chain.chain_id,
        &config.tokens,
    ));
    let ctx = SwapContext::new(registry, tokens, config);
    SwapExecutor::new(
        ctx,
        chain,
        config.chain.router_address.as_deref().map(Address::new),
        config.chain.sender.as_deref().map(Address::new),
    )
}

#[tokio::test]
async fn quote_then_execute_with_handle() {
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let chain = Arc::new(RecordingChain::default());
    let executor = build(&config, chain.clone());

    let quoted = quote(
        executor.context(),
        &QuoteRequest {
            token_in: "USDC".into(),
            token_out: "DAI".into(),
            amount: "1000".into(),
            slippage_bps: None,
            max_routes: None,
            max_hops: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(quoted.best_route.route.hops(), 2);

    let request = SwapRequest {
        token_in: "USDC".into(),
        token_out: "DAI".into(),
        amount: "1000".into(),
        slippage_bps: None,
        route_handle: Some(quoted.route_handle.clone()),
        recipient: "0x00000000000000000000000000000000000000c9".into(),
        deadline: None,
        deadline_seconds_from_now: Some(60),
        private_tx: false,
        max_fee_per_gas: None,
        max_priority_fee_per_gas: None,
        await_confirmation: None,
    };

    let first = executor.execute(&request).await.unwrap();
    assert!(first.success);
    assert_eq!(first.simulation.source, QuoteSource::RouteHandle);
    assert_eq!(first.simulation.expected_out, quoted.best_route.amount_out);
    assert_eq!(first.simulation.min_out, quoted.min_amount_out);
    assert_eq!(first.approval_tx, Some(TxHash::new("0xapprove")));
    assert!(first.receipt.is_some());

    // Reserves move between quote and execute; the handle still applies
    executor
        .context()
        .registry
        .refresh_runtime_pools(&ShallowerSource, true)
        .await
        .unwrap();
    let second = executor.execute(&request).await.unwrap();
    assert!(second.simulation.expected_out < first.simulation.expected_out);
    assert!(second.approval_tx.is_none(), "allowance is re-checked, not re-approved");

    let swaps = chain.swaps.lock().unwrap();
    assert_eq!(swaps.len(), 2);
    assert_eq!(swaps[0].path.len(), 3);
    assert_eq!(swaps[0].path, swaps[1].path);
    assert_eq!(swaps[1].min_out, second.simulation.min_out);
}
