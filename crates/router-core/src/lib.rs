//! router-core: Shared types, errors, and configuration
//!
//! This crate provides the foundational types used across the router workspace.

pub mod amount;
pub mod config;
pub mod errors;
pub mod types;

pub use amount::{format_units, parse_gas_fee, parse_units, AmountError};
pub use config::*;
pub use errors::*;
pub use types::*;
