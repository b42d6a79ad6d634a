//! router-api: HTTP API layer for the AMM router
//!
//! Exposes pool listing, quoting, and swap execution over JSON.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
