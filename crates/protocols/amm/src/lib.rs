//! Constant-Product AMM Routing and Swap Execution
//!
//! This crate implements pool caching, multi-hop route discovery, quoting,
//! route handles, and the simulate → approve → execute swap flow.

pub mod calculator;
pub mod constants;
pub mod context;
pub mod executor;
pub mod handle;
pub mod quote;
pub mod registry;
pub mod router;
pub mod state;
pub mod tokens;

// Re-exports
pub use calculator::{apply_slippage, price_impact_bps, quote_single_hop, HopQuote};
pub use constants::{fees, handle as handle_schema, routing, swap};
pub use context::SwapContext;
pub use executor::{
    Clock, QuoteSource, SwapExecutor, SwapRequest, SwapResult, SwapSimulation, SwapStage,
};
pub use handle::{decode_route, encode_route, reconstruct_route, HandleError, RouteHandle};
pub use quote::{quote, QuoteRequest, QuoteResponse};
pub use registry::PoolRegistry;
pub use router::{
    discover_routes, find_best_route_quote, find_best_routes, quote_direct, quote_route,
    rank_route_quotes,
};
pub use state::{Pool, PoolError, PoolKind, Route, RouteKind, RouteQuote, Token};
pub use tokens::{StaticTokenDirectory, TokenDirectory};
