//! AMM Constants
//!
//! Fee parameters, search bounds, and handle schema values.

/// Fee constants
pub mod fees {
    /// Basis-point denominator for pool fees and slippage
    pub const BPS_DENOM: u32 = 10_000;

    /// Fee applied to pools read on chain when the pair exposes none (0.3%)
    pub const DEFAULT_FEE_BPS: u32 = 30;
}

/// Route search bounds
pub mod routing {
    /// Hard ceiling on pools per route accepted from callers
    pub const MAX_HOPS_LIMIT: usize = 4;

    /// Depth used when the executor searches without an explicit handle
    pub const EXECUTION_MAX_HOPS: usize = 3;
}

/// Route handle wire schema
pub mod handle {
    /// Current schema version byte
    pub const VERSION: u8 = 1;

    /// Kind byte: ordered pool identities
    pub const KIND_POOLS: u8 = 0;

    /// Kind byte: forced live on-chain two-token quote
    pub const KIND_ONCHAIN_DIRECT: u8 = 1;

    /// Pool identities per handle (one length byte)
    pub const MAX_POOLS: usize = u8::MAX as usize;
}

/// Swap submission defaults
pub mod swap {
    /// Relative deadline applied when the request carries none
    pub const DEFAULT_DEADLINE_SECS: u64 = 300;
}
