//! Core type definitions for the AMM router

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel address standing in for the chain's native currency.
pub const NATIVE_SENTINEL: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// Lowercase an address so graph keys and path comparisons are case-insensitive.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// True for a `0x`-prefixed 20-byte hex address.
pub fn is_valid_address(address: &str) -> bool {
    address.starts_with("0x") && alloy_primitives::Address::from_str(address).is_ok()
}

/// Chain account or contract address (20 bytes, `0x`-prefixed, lowercase)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl AsRef<str>) -> Self {
        Self(normalize_address(addr.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the native-currency sentinel
    pub fn is_native(&self) -> bool {
        self.0 == NATIVE_SENTINEL
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(addr: alloy_primitives::Address) -> Self {
        Self::new(addr.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<alloy_primitives::TxHash> for TxHash {
    fn from(hash: alloy_primitives::TxHash) -> Self {
        Self(format!("{:#x}", hash))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric chain identifier (e.g. 1 for Ethereum mainnet)
pub type ChainId = u64;

/// Unix timestamp in seconds
pub type UnixSeconds = u64;

/// Basis points (1/100 of a percent)
pub type Bps = u32;

/// 10000 bps = 100%
pub const BPS_DENOMINATOR: u32 = 10_000;
