//! Token Directory
//!
//! Symbol → token descriptor resolution. The swap core only depends on the
//! [`TokenDirectory`] trait; [`StaticTokenDirectory`] serves config entries.

use std::collections::HashMap;

use router_core::{ChainId, TokenEntry};

use crate::state::Token;

pub trait TokenDirectory: Send + Sync {
    /// Resolve a symbol (case-insensitive) on `chain_id`
    fn resolve(&self, symbol: &str, chain_id: ChainId) -> Option<Token>;

    /// Every token known on `chain_id`
    fn list(&self, chain_id: ChainId) -> Vec<Token>;
}

/// Fixed token list for a single chain
#[derive(Debug, Clone)]
pub struct StaticTokenDirectory {
    chain_id: ChainId,
    by_symbol: HashMap<String, Token>,
    order: Vec<String>,
}

impl StaticTokenDirectory {
    pub fn new(chain_id: ChainId, tokens: Vec<Token>) -> Self {
        let mut by_symbol = HashMap::new();
        let mut order = Vec::new();
        for token in tokens {
            let key = token.symbol.to_ascii_uppercase();
            if by_symbol.insert(key.clone(), token).is_none() {
                order.push(key);
            }
        }
        Self {
            chain_id,
            by_symbol,
            order,
        }
    }

    pub fn from_entries(chain_id: ChainId, entries: &[TokenEntry]) -> Self {
        Self::new(
            chain_id,
            entries
                .iter()
                .map(|e| Token::new(&e.symbol, &e.address, e.decimals))
                .collect(),
        )
    }
}

impl TokenDirectory for StaticTokenDirectory {
    fn resolve(&self, symbol: &str, chain_id: ChainId) -> Option<Token> {
        if chain_id != self.chain_id {
            return None;
        }
        self.by_symbol
            .get(&symbol.trim().to_ascii_uppercase())
            .cloned()
    }

    fn list(&self, chain_id: ChainId) -> Vec<Token> {
        if chain_id != self.chain_id {
            return Vec::new();
        }
        self.order
            .iter()
            .filter_map(|key| self.by_symbol.get(key).cloned())
            .collect()
    }
}
