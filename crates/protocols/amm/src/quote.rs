//! Quote operation: price every route for a pair and hand back the best
//! one together with a route handle for a later execute call.

use num_bigint::BigUint;
use router_core::amount::serde_decimal;
use router_core::{format_units, ErrorKind, SwapError};
use serde::{Deserialize, Serialize};

use crate::calculator::apply_slippage;
use crate::constants::routing::MAX_HOPS_LIMIT;
use crate::context::SwapContext;
use crate::handle::encode_route;
use crate::router::find_best_routes;
use crate::state::{RouteQuote, Token};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub token_in: String,
    pub token_out: String,
    /// Human-readable amount of `token_in`
    pub amount: String,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    #[serde(default)]
    pub max_routes: Option<usize>,
    #[serde(default)]
    pub max_hops: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub token_in: Token,
    pub token_out: Token,
    #[serde(with = "serde_decimal")]
    pub amount_in: BigUint,
    /// Best first, at most `max_routes`
    pub routes: Vec<RouteQuote>,
    pub best_route: RouteQuote,
    /// Opaque handle pinning `best_route`'s pools
    pub route_handle: String,
    #[serde(with = "serde_decimal")]
    pub min_amount_out: BigUint,
    /// `best_route` output in `token_out` units
    pub amount_out_display: String,
    pub slippage_bps: u32,
}

/// Price `request` against the current pool snapshot.
pub async fn quote(ctx: &SwapContext, request: &QuoteRequest) -> Result<QuoteResponse, SwapError> {
    let token_in = ctx.resolve_token(&request.token_in)?;
    let token_out = ctx.resolve_token(&request.token_out)?;
    let amount_in = ctx.parse_amount(&token_in, &request.amount)?;
    let slippage_bps = ctx.slippage_bps(request.slippage_bps)?;

    let max_hops = request
        .max_hops
        .unwrap_or(ctx.defaults.max_hops)
        .clamp(1, MAX_HOPS_LIMIT);
    let max_routes = request.max_routes.unwrap_or(ctx.defaults.max_routes).max(1);

    let from = ctx.routing_address(&token_in)?;
    let to = ctx.routing_address(&token_out)?;
    if from == to {
        return Err(SwapError::new(
            ErrorKind::RouteNotFound,
            format!("{} and {} trade as the same asset", token_in.symbol, token_out.symbol),
        ));
    }

    let pools = ctx.registry.snapshot().await;
    let routes = find_best_routes(&pools, &from, &to, &amount_in, max_hops, max_routes);
    tracing::debug!(
        "Quoted {} routes {} -> {} (max_hops={})",
        routes.len(),
        token_in.symbol,
        token_out.symbol,
        max_hops
    );

    let best_route = routes.first().cloned().ok_or_else(|| {
        SwapError::new(
            ErrorKind::RouteNotFound,
            format!(
                "No priced route from {} to {} within {} hops",
                token_in.symbol, token_out.symbol, max_hops
            ),
        )
    })?;

    let route_handle = encode_route(&best_route.route)
        .map_err(|e| SwapError::wrap(ErrorKind::Unknown, "Failed to encode route handle", e))?;
    let min_amount_out = apply_slippage(&best_route.amount_out, slippage_bps);
    let amount_out_display = format_units(&best_route.amount_out, token_out.decimals);

    Ok(QuoteResponse {
        token_in,
        token_out,
        amount_in,
        routes,
        best_route,
        route_handle,
        min_amount_out,
        amount_out_display,
        slippage_bps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::decode_route;
    use crate::registry::PoolRegistry;
    use crate::state::{Pool, RouteKind};
    use crate::tokens::StaticTokenDirectory;
    use router_core::{Address, AppConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn addr(n: u8) -> String {
        format!("0x{:040x}", n)
    }

    fn context() -> SwapContext {
        let tokens = StaticTokenDirectory::new(
            1,
            vec![
                Token::new("AAA", addr(1), 18),
                Token::new("BBB", addr(2), 18),
                Token::new("CCC", addr(3), 6),
                Token::new("ETH", router_core::NATIVE_SENTINEL, 18),
                Token::new("WETH", addr(9), 18),
            ],
        );
        let e18 = BigUint::from(10u64).pow(18);
        let pools = vec![
            Pool::new(addr(101), addr(1), addr(2), &e18 * 1_000u32, &e18 * 1_000u32, 30).unwrap(),
            Pool::new(addr(102), addr(2), addr(3), &e18 * 1_000u32, BigUint::from(1_000_000_000u64), 30)
                .unwrap(),
        ];
        let registry = Arc::new(PoolRegistry::new(pools, Duration::from_secs(30)));
        let mut config = AppConfig::default();
        config.chain.wrapped_native = Some(addr(9));
        SwapContext::new(registry, Arc::new(tokens), &config)
    }

    fn request(token_in: &str, token_out: &str, amount: &str) -> QuoteRequest {
        QuoteRequest {
            token_in: token_in.into(),
            token_out: token_out.into(),
            amount: amount.into(),
            slippage_bps: Some(100),
            max_routes: None,
            max_hops: None,
        }
    }

    #[tokio::test]
    async fn test_quote_multi_hop_with_handle() {
        let ctx = context();
        let response = quote(&ctx, &request("aaa", "CCC", "1.5")).await.unwrap();

        assert_eq!(response.best_route.kind, RouteKind::MultiHop);
        assert_eq!(response.best_route.route.hops(), 2);
        assert_eq!(
            response.min_amount_out,
            apply_slippage(&response.best_route.amount_out, 100)
        );

        let pools = ctx.registry.snapshot().await;
        let decoded = decode_route(
            &Address::new(addr(1)),
            &Address::new(addr(3)),
            &response.route_handle,
            &pools,
        )
        .unwrap();
        assert_eq!(decoded, response.best_route.route);
    }

    #[tokio::test]
    async fn test_quote_hop_bound_excludes_route() {
        let ctx = context();
        let mut req = request("AAA", "CCC", "1");
        req.max_hops = Some(1);
        let err = quote(&ctx, &req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RouteNotFound);
    }

    #[tokio::test]
    async fn test_quote_rejects_bad_input() {
        let ctx = context();
        let err = quote(&ctx, &request("DOGE", "CCC", "1")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedToken);

        let err = quote(&ctx, &request("AAA", "CCC", "1e3")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAmount);

        let err = quote(&ctx, &request("AAA", "CCC", "0")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAmount);

        let mut req = request("AAA", "CCC", "1");
        req.slippage_bps = Some(10_001);
        assert_eq!(quote(&ctx, &req).await.unwrap_err().kind, ErrorKind::InvalidAmount);
    }

    #[tokio::test]
    async fn test_native_and_wrapped_are_same_asset() {
        let ctx = context();
        let err = quote(&ctx, &request("ETH", "WETH", "1")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RouteNotFound);
    }
}
