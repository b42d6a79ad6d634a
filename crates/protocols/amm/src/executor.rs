//! Swap Orchestrator
//!
//! Drives one swap through
//! `RESOLVE_TOKENS → SIMULATE → [CHECK_ALLOWANCE → APPROVE] → EXECUTE → [AWAIT_CONFIRMATION]`.
//!
//! Everything that can be rejected locally (tokens, router, deadline, gas
//! fees, amount) is checked before the first chain call. Approve and swap are
//! two separate transactions; a retry re-reads the allowance and skips the
//! approval once it is sufficient.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chain_client::{ChainClient, SwapCall, SwapMethod, TxReceipt};
use num_bigint::BigUint;
use num_traits::Zero;
use router_core::amount::{serde_decimal, serde_decimal_opt};
use router_core::{
    classify_revert, parse_gas_fee, Address, ChainError, ErrorKind, SwapError, TxHash,
    UnixSeconds,
};
use serde::{Deserialize, Serialize};

use crate::calculator::apply_slippage;
use crate::constants::routing::EXECUTION_MAX_HOPS;
use crate::context::SwapContext;
use crate::handle::{reconstruct_route, RouteHandle};
use crate::router::{find_best_route_quote, quote_direct, quote_route};
use crate::state::{Route, RouteQuote, Token};

/// Current unix time source
pub type Clock = Arc<dyn Fn() -> UnixSeconds + Send + Sync>;

fn system_clock() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub token_in: String,
    pub token_out: String,
    /// Human-readable amount of `token_in`
    pub amount: String,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    /// Handle from a previous quote; re-priced, never trusted
    #[serde(default)]
    pub route_handle: Option<String>,
    pub recipient: String,
    /// Absolute unix deadline
    #[serde(default)]
    pub deadline: Option<UnixSeconds>,
    #[serde(default)]
    pub deadline_seconds_from_now: Option<u64>,
    /// Declared intent only; submission is not private
    #[serde(default)]
    pub private_tx: bool,
    /// gwei, decimal
    #[serde(default)]
    pub max_fee_per_gas: Option<String>,
    /// gwei, decimal
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default)]
    pub await_confirmation: Option<bool>,
}

/// Where the expected output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteSource {
    /// Forced live router quote from an on-chain-direct handle
    OnchainDirect,
    /// Caller's handle re-priced against current reserves
    RouteHandle,
    /// Best discovered route
    BestRoute,
    /// Legacy single-pool lookup
    DirectPool,
    /// Live router quote after local pricing found nothing
    OnchainFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSimulation {
    pub token_in: Token,
    pub token_out: Token,
    #[serde(with = "serde_decimal")]
    pub amount_in: BigUint,
    #[serde(with = "serde_decimal")]
    pub expected_out: BigUint,
    #[serde(with = "serde_decimal")]
    pub min_out: BigUint,
    pub price_impact_bps: Option<u32>,
    pub slippage_bps: u32,
    /// Execution path in pool token addresses
    pub path: Vec<Address>,
    /// Local route used; `None` for on-chain quotes
    pub route: Option<Route>,
    pub source: QuoteSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResult {
    pub success: bool,
    pub tx_hash: TxHash,
    pub approval_tx: Option<TxHash>,
    pub receipt: Option<TxReceipt>,
    pub method: SwapMethod,
    pub simulation: SwapSimulation,
    pub deadline: UnixSeconds,
    #[serde(with = "serde_decimal_opt")]
    pub max_fee_per_gas: Option<BigUint>,
    #[serde(with = "serde_decimal_opt")]
    pub max_priority_fee_per_gas: Option<BigUint>,
    /// Node gas price at submission, when no overrides were given
    #[serde(with = "serde_decimal_opt")]
    pub gas_price: Option<BigUint>,
    pub private_tx: bool,
}

/// State machine position, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    ResolveTokens,
    Simulate,
    CheckAllowance,
    Approve,
    Execute,
    AwaitConfirmation,
    Done,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapStage::ResolveTokens => "RESOLVE_TOKENS",
            SwapStage::Simulate => "SIMULATE",
            SwapStage::CheckAllowance => "CHECK_ALLOWANCE",
            SwapStage::Approve => "APPROVE",
            SwapStage::Execute => "EXECUTE",
            SwapStage::AwaitConfirmation => "AWAIT_CONFIRMATION",
            SwapStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Resolved tokens and amounts for one request
struct Resolved {
    token_in: Token,
    token_out: Token,
    path_in: Address,
    path_out: Address,
    amount_in: BigUint,
    slippage_bps: u32,
}

pub struct SwapExecutor {
    ctx: SwapContext,
    chain: Arc<dyn ChainClient>,
    router_address: Option<Address>,
    sender: Option<Address>,
    clock: Clock,
}

impl SwapExecutor {
    pub fn new(
        ctx: SwapContext,
        chain: Arc<dyn ChainClient>,
        router_address: Option<Address>,
        sender: Option<Address>,
    ) -> Self {
        Self {
            ctx,
            chain,
            router_address,
            sender,
            clock: Arc::new(system_clock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Router swaps are submitted to; execution is refused while unset
    pub fn router_address(&self) -> Option<&Address> {
        self.router_address.as_ref()
    }

    pub fn context(&self) -> &SwapContext {
        &self.ctx
    }

    /// Price a request without touching allowances or submitting anything.
    pub async fn simulate(&self, request: &SwapRequest) -> Result<SwapSimulation, SwapError> {
        let resolved = self.resolve(request)?;
        self.simulate_resolved(&resolved, request.route_handle.as_deref())
            .await
    }

    /// Run the full swap.
    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapResult, SwapError> {
        log_stage(SwapStage::ResolveTokens);
        let resolved = self.resolve(request)?;
        let recipient = Address::new(&request.recipient);
        if !router_core::is_valid_address(recipient.as_str()) {
            return Err(SwapError::new(
                ErrorKind::InvalidRecipient,
                format!("Recipient '{}' is not an address", request.recipient),
            ));
        }

        let router = self.router_address.clone().ok_or_else(|| {
            SwapError::new(ErrorKind::RouterNotSet, "Swap router address is not configured")
        })?;
        let deadline = self.compute_deadline(request)?;
        let max_fee_per_gas = request
            .max_fee_per_gas
            .as_deref()
            .map(|v| parse_gas_fee("max_fee_per_gas", v))
            .transpose()?;
        let max_priority_fee_per_gas = request
            .max_priority_fee_per_gas
            .as_deref()
            .map(|v| parse_gas_fee("max_priority_fee_per_gas", v))
            .transpose()?;

        log_stage(SwapStage::Simulate);
        let simulation = self
            .simulate_resolved(&resolved, request.route_handle.as_deref())
            .await?;
        validate_endpoints(&simulation.path, &resolved.path_in, &resolved.path_out)?;

        let approval_tx = if resolved.token_in.is_native() {
            None
        } else {
            let owner = self.sender.clone().unwrap_or_else(|| recipient.clone());
            self.ensure_allowance(&resolved, &owner, &router).await?
        };

        let gas_price = if max_fee_per_gas.is_none() && max_priority_fee_per_gas.is_none() {
            match self.chain.read_gas_price().await {
                Ok(price) => Some(price),
                Err(e) => {
                    tracing::debug!("Gas price unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if request.private_tx {
            tracing::warn!("private_tx requested but transactions are submitted publicly");
        }

        log_stage(SwapStage::Execute);
        let method = swap_method(&resolved.token_in, &resolved.token_out);
        let call = SwapCall {
            router,
            method,
            amount_in: resolved.amount_in.clone(),
            min_out: simulation.min_out.clone(),
            path: simulation.path.clone(),
            recipient,
            deadline,
            max_fee_per_gas: max_fee_per_gas.clone(),
            max_priority_fee_per_gas: max_priority_fee_per_gas.clone(),
        };
        let tx_hash = self
            .chain
            .submit_swap(&call)
            .await
            .map_err(|e| classify_chain_failure("Swap submission failed", e))?;
        tracing::info!(
            "Submitted swap {} {} -> {} (min_out={}, deadline={})",
            tx_hash,
            resolved.token_in.symbol,
            resolved.token_out.symbol,
            call.min_out,
            deadline
        );

        let await_confirmation = request
            .await_confirmation
            .unwrap_or(self.ctx.defaults.await_confirmation);
        let receipt = if await_confirmation {
            log_stage(SwapStage::AwaitConfirmation);
            let receipt = self
                .chain
                .await_receipt(&tx_hash)
                .await
                .map_err(|e| classify_chain_failure("Swap confirmation failed", e))?;
            if !receipt.success {
                return Err(SwapError::new(
                    ErrorKind::ExecutionReverted,
                    format!("Swap {} reverted in block {}", tx_hash, receipt.block_number),
                ));
            }
            Some(receipt)
        } else {
            None
        };

        log_stage(SwapStage::Done);
        Ok(SwapResult {
            success: true,
            tx_hash,
            approval_tx,
            receipt,
            method,
            simulation,
            deadline,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_price,
            private_tx: request.private_tx,
        })
    }

    fn resolve(&self, request: &SwapRequest) -> Result<Resolved, SwapError> {
        let token_in = self.ctx.resolve_token(&request.token_in)?;
        let token_out = self.ctx.resolve_token(&request.token_out)?;
        let path_in = self.ctx.routing_address(&token_in)?;
        let path_out = self.ctx.routing_address(&token_out)?;
        if path_in == path_out {
            return Err(SwapError::new(
                ErrorKind::RouteNotFound,
                format!("{} and {} trade as the same asset", token_in.symbol, token_out.symbol),
            ));
        }
        let amount_in = self.ctx.parse_amount(&token_in, &request.amount)?;
        let slippage_bps = self.ctx.slippage_bps(request.slippage_bps)?;

        Ok(Resolved {
            token_in,
            token_out,
            path_in,
            path_out,
            amount_in,
            slippage_bps,
        })
    }

    /// Absolute deadline; must be strictly after now
    fn compute_deadline(&self, request: &SwapRequest) -> Result<UnixSeconds, SwapError> {
        let now = (self.clock)();
        let deadline = match request.deadline {
            Some(deadline) => deadline,
            None => {
                let relative = request
                    .deadline_seconds_from_now
                    .unwrap_or(self.ctx.defaults.default_deadline_secs);
                now.saturating_add(relative)
            }
        };
        if deadline <= now {
            return Err(SwapError::new(
                ErrorKind::DeadlinePast,
                format!("Deadline {} is not after current time {}", deadline, now),
            ));
        }
        Ok(deadline)
    }

    async fn simulate_resolved(
        &self,
        resolved: &Resolved,
        route_handle: Option<&str>,
    ) -> Result<SwapSimulation, SwapError> {
        let (source, quote) = match route_handle {
            Some(handle) => self.quote_from_handle(resolved, handle).await?,
            None => self.quote_best(resolved).await?,
        };

        let (expected_out, price_impact_bps, path, route) = match quote {
            Quoted::Local(q) => (
                q.amount_out,
                q.price_impact_bps,
                q.route.tokens.clone(),
                Some(q.route),
            ),
            Quoted::Onchain(out) => (
                out,
                None,
                vec![resolved.path_in.clone(), resolved.path_out.clone()],
                None,
            ),
        };

        if expected_out.is_zero() {
            return Err(SwapError::new(
                ErrorKind::InsufficientLiquidity,
                format!(
                    "{} {} yields no {}",
                    resolved.amount_in, resolved.token_in.symbol, resolved.token_out.symbol
                ),
            ));
        }

        let min_out = apply_slippage(&expected_out, resolved.slippage_bps);
        tracing::debug!(
            "Simulated {:?}: expected_out={} min_out={} impact={:?}",
            source,
            expected_out,
            min_out,
            price_impact_bps
        );

        Ok(SwapSimulation {
            token_in: resolved.token_in.clone(),
            token_out: resolved.token_out.clone(),
            amount_in: resolved.amount_in.clone(),
            expected_out,
            min_out,
            price_impact_bps,
            slippage_bps: resolved.slippage_bps,
            path,
            route,
            source,
        })
    }

    async fn quote_from_handle(
        &self,
        resolved: &Resolved,
        handle: &str,
    ) -> Result<(QuoteSource, Quoted), SwapError> {
        let requote_failed = |detail: String| {
            SwapError::new(
                ErrorKind::RouteRequoteFailed,
                format!("Route handle no longer prices: {}", detail),
            )
        };

        match RouteHandle::decode(handle) {
            Ok(RouteHandle::OnchainDirect) => {
                let out = self.quote_onchain(resolved).await?.ok_or_else(|| {
                    SwapError::new(
                        ErrorKind::RouterNotSet,
                        "On-chain quote requested but no router is configured",
                    )
                })?;
                Ok((QuoteSource::OnchainDirect, Quoted::Onchain(out)))
            }
            Ok(RouteHandle::Pools(ids)) => {
                let pools = self.ctx.registry.snapshot().await;
                let route =
                    reconstruct_route(&resolved.path_in, &resolved.path_out, &ids, &pools)
                        .ok_or_else(|| {
                            requote_failed("pools missing or no longer connect the pair".into())
                        })?;
                let quote = quote_route(&route, &resolved.amount_in)
                    .ok_or_else(|| requote_failed("a hop lacks liquidity".into()))?;
                Ok((QuoteSource::RouteHandle, Quoted::Local(quote)))
            }
            Err(e) => Err(requote_failed(e.to_string())),
        }
    }

    async fn quote_best(&self, resolved: &Resolved) -> Result<(QuoteSource, Quoted), SwapError> {
        let pools = self.ctx.registry.snapshot().await;
        let (from, to, amount) = (&resolved.path_in, &resolved.path_out, &resolved.amount_in);

        if let Some(quote) = find_best_route_quote(&pools, from, to, amount, EXECUTION_MAX_HOPS) {
            return Ok((QuoteSource::BestRoute, Quoted::Local(quote)));
        }
        if let Some(quote) = quote_direct(&pools, from, to, amount) {
            return Ok((QuoteSource::DirectPool, Quoted::Local(quote)));
        }

        tracing::debug!("No local route {} -> {}, asking router", from, to);
        match self.quote_onchain(resolved).await? {
            Some(out) => Ok((QuoteSource::OnchainFallback, Quoted::Onchain(out))),
            None => Err(SwapError::new(
                ErrorKind::RouteNotFound,
                format!(
                    "No route from {} to {}",
                    resolved.token_in.symbol, resolved.token_out.symbol
                ),
            )),
        }
    }

    /// Live two-token router quote; `None` without a router
    async fn quote_onchain(&self, resolved: &Resolved) -> Result<Option<BigUint>, SwapError> {
        let Some(router) = &self.router_address else {
            return Ok(None);
        };
        let path = [resolved.path_in.clone(), resolved.path_out.clone()];
        self.chain
            .quote_amounts_out(router, &resolved.amount_in, &path)
            .await
            .map(Some)
            .map_err(|e| {
                let kind = e
                    .revert_reason()
                    .map(classify_revert)
                    .filter(|k| *k == ErrorKind::InsufficientLiquidity)
                    .unwrap_or(ErrorKind::SimulationFailed);
                SwapError::wrap(kind, "On-chain quote failed", e)
            })
    }

    /// Approve the router when the allowance is short; returns the approval tx.
    async fn ensure_allowance(
        &self,
        resolved: &Resolved,
        owner: &Address,
        router: &Address,
    ) -> Result<Option<TxHash>, SwapError> {
        log_stage(SwapStage::CheckAllowance);
        let token = &resolved.token_in.address;
        let allowance = self
            .chain
            .read_allowance(token, owner, router)
            .await
            .map_err(|e| {
                SwapError::wrap(
                    ErrorKind::AllowanceReadFailed,
                    format!("Could not read {} allowance", resolved.token_in.symbol),
                    e,
                )
            })?;
        if allowance >= resolved.amount_in {
            tracing::debug!("Allowance {} covers {}", allowance, resolved.amount_in);
            return Ok(None);
        }

        log_stage(SwapStage::Approve);
        let approval_failed = |e: ChainError| {
            SwapError::wrap(
                ErrorKind::ApprovalFailed,
                format!("Approval of {} failed", resolved.token_in.symbol),
                e,
            )
        };
        let tx_hash = self
            .chain
            .submit_approval(token, router, &resolved.amount_in)
            .await
            .map_err(approval_failed)?;
        tracing::info!(
            "Submitted approval {} for {} {}",
            tx_hash,
            resolved.amount_in,
            resolved.token_in.symbol
        );

        let receipt = self
            .chain
            .await_receipt(&tx_hash)
            .await
            .map_err(approval_failed)?;
        if !receipt.success {
            return Err(SwapError::new(
                ErrorKind::ApprovalFailed,
                format!("Approval {} reverted", tx_hash),
            ));
        }
        Ok(Some(tx_hash))
    }
}

enum Quoted {
    Local(RouteQuote),
    Onchain(BigUint),
}

fn log_stage(stage: SwapStage) {
    tracing::debug!("swap stage {}", stage);
}

fn swap_method(token_in: &Token, token_out: &Token) -> SwapMethod {
    if token_in.is_native() {
        SwapMethod::ExactNativeForTokens
    } else if token_out.is_native() {
        SwapMethod::ExactTokensForNative
    } else {
        SwapMethod::ExactTokensForTokens
    }
}

fn validate_endpoints(
    path: &[Address],
    token_in: &Address,
    token_out: &Address,
) -> Result<(), SwapError> {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) if first == token_in && last == token_out => Ok(()),
        _ => Err(SwapError::new(
            ErrorKind::RouteEndpointMismatch,
            format!(
                "Execution path {:?} does not run {} -> {}",
                path.iter().map(Address::as_str).collect::<Vec<_>>(),
                token_in,
                token_out
            ),
        )),
    }
}

/// Map a submission or confirmation failure to a swap error kind
fn classify_chain_failure(context: &str, error: ChainError) -> SwapError {
    let kind = match (&error, error.revert_reason()) {
        (_, Some(reason)) => classify_revert(reason),
        (ChainError::Reverted { .. }, None) => ErrorKind::ExecutionReverted,
        _ => ErrorKind::Unknown,
    };
    SwapError::wrap(kind, context, error)
}
