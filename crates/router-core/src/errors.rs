//! Error types for the AMM router

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed lower-level cause kept for diagnostics
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Closed set of swap failure kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UnsupportedToken,
    RouterNotSet,
    DeadlinePast,
    GasFeeInvalid,
    InvalidAmount,
    InvalidRecipient,
    SimulationFailed,
    AllowanceReadFailed,
    ApprovalFailed,
    ExecutionReverted,
    SlippageExceeded,
    InsufficientLiquidity,
    RouteNotFound,
    RouteEndpointMismatch,
    RouteRequoteFailed,
    Unknown,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedToken => "UNSUPPORTED_TOKEN",
            Self::RouterNotSet => "ROUTER_NOT_SET",
            Self::DeadlinePast => "DEADLINE_PAST",
            Self::GasFeeInvalid => "GAS_FEE_INVALID",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidRecipient => "INVALID_RECIPIENT",
            Self::SimulationFailed => "SIMULATION_FAILED",
            Self::AllowanceReadFailed => "ALLOWANCE_READ_FAILED",
            Self::ApprovalFailed => "APPROVAL_FAILED",
            Self::ExecutionReverted => "EXECUTION_REVERTED",
            Self::SlippageExceeded => "SLIPPAGE_EXCEEDED",
            Self::InsufficientLiquidity => "INSUFFICIENT_LIQUIDITY",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::RouteEndpointMismatch => "ROUTE_ENDPOINT_MISMATCH",
            Self::RouteRequoteFailed => "ROUTE_REQUOTE_FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Get HTTP status code for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedToken
            | Self::DeadlinePast
            | Self::GasFeeInvalid
            | Self::InvalidAmount
            | Self::InvalidRecipient
            | Self::RouteEndpointMismatch => 400,
            Self::RouteNotFound => 404,
            Self::RouteRequoteFailed => 409,
            Self::InsufficientLiquidity | Self::SlippageExceeded | Self::ExecutionReverted => 422,
            Self::RouterNotSet => 503,
            Self::SimulationFailed
            | Self::AllowanceReadFailed
            | Self::ApprovalFailed
            | Self::Unknown => 502,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified swap failure.
///
/// The message is safe to show to callers; `source` keeps the original cause
/// for logs and is never serialized.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct SwapError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxedCause>,
}

impl SwapError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure under a stable kind
    pub fn wrap(
        kind: ErrorKind,
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Chain RPC and transport errors
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("RPC endpoint unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("RPC returned error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        /// Decoded revert reason, when the node attached one
        revert_reason: Option<String>,
    },

    #[error("RPC request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to encode call: {0}")]
    Encode(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("No receipt for {tx_hash} after {secs}s")]
    ReceiptTimeout { tx_hash: String, secs: u64 },
}

impl ChainError {
    /// Revert text carried by this error, if any
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::Rpc {
                revert_reason: Some(reason),
                ..
            } => Some(reason),
            Self::Rpc { message, .. } if message.contains("revert") => Some(message),
            _ => None,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Classify a revert reason into a stable kind.
///
/// Router and pair contracts report liquidity and min-out failures with
/// well-known strings; anything unrecognised stays a generic revert.
pub fn classify_revert(reason: &str) -> ErrorKind {
    let lower = reason.to_ascii_lowercase();
    if lower.contains("insufficient_liquidity") || lower.contains("insufficient liquidity") {
        ErrorKind::InsufficientLiquidity
    } else if lower.contains("insufficient_output_amount")
        || lower.contains("too little received")
        || lower.contains("slippage")
    {
        ErrorKind::SlippageExceeded
    } else {
        ErrorKind::ExecutionReverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorKind::DeadlinePast.code(), "DEADLINE_PAST");
        assert_eq!(ErrorKind::DeadlinePast.status_code(), 400);
        assert_eq!(ErrorKind::RouterNotSet.status_code(), 503);
        assert_eq!(ErrorKind::RouteNotFound.status_code(), 404);
        assert_eq!(ErrorKind::InvalidRecipient.code(), "INVALID_RECIPIENT");
        assert_eq!(ErrorKind::InvalidRecipient.status_code(), 400);
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::GasFeeInvalid).unwrap();
        assert_eq!(json, "\"GAS_FEE_INVALID\"");
    }

    #[test]
    fn test_classify_revert() {
        assert_eq!(
            classify_revert("execution reverted: UniswapV2: INSUFFICIENT_LIQUIDITY"),
            ErrorKind::InsufficientLiquidity
        );
        assert_eq!(
            classify_revert("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT"),
            ErrorKind::SlippageExceeded
        );
        assert_eq!(classify_revert("Too little received"), ErrorKind::SlippageExceeded);
        assert_eq!(
            classify_revert("TransferHelper: TRANSFER_FROM_FAILED"),
            ErrorKind::ExecutionReverted
        );
    }

    #[test]
    fn test_wrap_keeps_source() {
        let cause = ChainError::Timeout { secs: 30 };
        let err = SwapError::wrap(ErrorKind::AllowanceReadFailed, "allowance read failed", cause);
        assert_eq!(err.code(), "ALLOWANCE_READ_FAILED");
        assert!(StdError::source(&err).is_some());
        assert_eq!(err.to_string(), "ALLOWANCE_READ_FAILED: allowance read failed");
    }

    #[test]
    fn test_revert_reason_from_message() {
        let err = ChainError::Rpc {
            code: 3,
            message: "execution reverted: INSUFFICIENT_OUTPUT_AMOUNT".into(),
            revert_reason: None,
        };
        assert!(err.revert_reason().is_some());
        assert!(ChainError::Timeout { secs: 1 }.revert_reason().is_none());
    }
}
