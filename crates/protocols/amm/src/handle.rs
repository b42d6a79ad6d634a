//! Route Handle Codec
//!
//! A handle pins the topology of a quoted route (its ordered pool identities)
//! so a later execute call can re-price the same path against fresh reserves.
//!
//! Wire form is lowercase hex of:
//!
//! ```text
//! [version: u8][kind: u8][count: u8]([len: u8][pool id: utf-8])*
//! ```

use router_core::{normalize_address, Address};
use thiserror::Error;

use crate::constants::handle::{KIND_ONCHAIN_DIRECT, KIND_POOLS, MAX_POOLS, VERSION};
use crate::state::{Pool, Route};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("Handle is not valid hex")]
    InvalidHex,

    #[error("Handle truncated")]
    Truncated,

    #[error("Unsupported handle version {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown handle kind {0}")]
    UnknownKind(u8),

    #[error("Handle has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("Handle names no pools")]
    Empty,

    #[error("On-chain direct handle must carry no pools, found count {0}")]
    UnexpectedCount(usize),

    #[error("Pool id is not valid UTF-8")]
    InvalidPoolId,

    #[error("Route too long to encode: {0}")]
    TooLong(String),
}

/// Decoded route handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteHandle {
    /// Ordered pool identities of a locally quoted route
    Pools(Vec<String>),
    /// Skip local pool math and ask the router contract for a direct quote
    OnchainDirect,
}

impl RouteHandle {
    pub fn from_route(route: &Route) -> Self {
        RouteHandle::Pools(route.pool_ids())
    }

    pub fn encode(&self) -> Result<String, HandleError> {
        let mut bytes = vec![VERSION];
        match self {
            RouteHandle::OnchainDirect => {
                bytes.extend_from_slice(&[KIND_ONCHAIN_DIRECT, 0]);
            }
            RouteHandle::Pools(ids) => {
                if ids.is_empty() {
                    return Err(HandleError::Empty);
                }
                let count = u8::try_from(ids.len())
                    .ok()
                    .filter(|n| usize::from(*n) <= MAX_POOLS)
                    .ok_or_else(|| HandleError::TooLong(format!("{} pools", ids.len())))?;
                bytes.extend_from_slice(&[KIND_POOLS, count]);
                for id in ids {
                    let raw = id.as_bytes();
                    let len = u8::try_from(raw.len())
                        .map_err(|_| HandleError::TooLong(format!("pool id {}", id)))?;
                    bytes.push(len);
                    bytes.extend_from_slice(raw);
                }
            }
        }
        Ok(hex::encode(bytes))
    }

    pub fn decode(handle: &str) -> Result<Self, HandleError> {
        let bytes = hex::decode(handle.trim()).map_err(|_| HandleError::InvalidHex)?;
        let mut reader = Reader { bytes: &bytes, pos: 0 };

        let version = reader.byte()?;
        if version != VERSION {
            return Err(HandleError::UnsupportedVersion(version));
        }
        let kind = reader.byte()?;
        let count = usize::from(reader.byte()?);

        let decoded = match kind {
            KIND_ONCHAIN_DIRECT => {
                if count != 0 {
                    return Err(HandleError::UnexpectedCount(count));
                }
                RouteHandle::OnchainDirect
            }
            KIND_POOLS => {
                if count == 0 {
                    return Err(HandleError::Empty);
                }
                let mut ids = Vec::with_capacity(count);
                for _ in 0..count {
                    let len = usize::from(reader.byte()?);
                    let raw = reader.take(len)?;
                    let id = std::str::from_utf8(raw).map_err(|_| HandleError::InvalidPoolId)?;
                    ids.push(normalize_address(id));
                }
                RouteHandle::Pools(ids)
            }
            other => return Err(HandleError::UnknownKind(other)),
        };

        let rest = reader.remaining();
        if rest > 0 {
            return Err(HandleError::TrailingBytes(rest));
        }
        Ok(decoded)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> Result<u8, HandleError> {
        Ok(self.take(1)?[0])
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], HandleError> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end).ok_or(HandleError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Encode a quoted route's pool identities
pub fn encode_route(route: &Route) -> Result<String, HandleError> {
    RouteHandle::from_route(route).encode()
}

/// Rebuild a route from pool ids against the current pool set.
///
/// Walks from `token_in`, crossing each pool to its other token. Returns `None`
/// if a pool is missing, does not touch the running token, revisits a token,
/// or the walk does not end at `token_out`.
pub fn reconstruct_route(
    token_in: &Address,
    token_out: &Address,
    pool_ids: &[String],
    pools: &[Pool],
) -> Option<Route> {
    if pool_ids.is_empty() {
        return None;
    }

    let mut route_pools = Vec::with_capacity(pool_ids.len());
    let mut tokens = vec![token_in.clone()];
    let mut current = token_in.clone();

    for id in pool_ids {
        let pool = pools.iter().find(|p| &p.id == id)?;
        let next = pool.other_token(&current)?.clone();
        if tokens.contains(&next) {
            return None;
        }
        route_pools.push(pool.clone());
        tokens.push(next.clone());
        current = next;
    }

    if &current != token_out {
        return None;
    }

    Some(Route {
        pools: route_pools,
        tokens,
    })
}

/// Decode a handle and rebuild its route.
///
/// Any failure, including a malformed handle or the on-chain direct variant,
/// yields `None` so the caller re-quotes.
pub fn decode_route(
    token_in: &Address,
    token_out: &Address,
    handle: &str,
    pools: &[Pool],
) -> Option<Route> {
    match RouteHandle::decode(handle) {
        Ok(RouteHandle::Pools(ids)) => reconstruct_route(token_in, token_out, &ids, pools),
        Ok(RouteHandle::OnchainDirect) => None,
        Err(e) => {
            tracing::debug!("Discarding route handle: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn token(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn pool_id(n: u8) -> String {
        format!("0x{:040x}", 0xa0 + n as u32)
    }

    fn make_pool(n: u8, a: u8, b: u8) -> Pool {
        Pool::new(
            pool_id(n),
            token(a).as_str(),
            token(b).as_str(),
            BigUint::from(1_000u32),
            BigUint::from(1_000u32),
            30,
        )
        .unwrap()
    }

    fn chain() -> Vec<Pool> {
        vec![make_pool(1, 1, 2), make_pool(2, 2, 3), make_pool(3, 3, 4)]
    }

    #[test]
    fn test_handle_reconstructs_same_pools() {
        let pools = chain();
        let ids: Vec<String> = pools.iter().map(|p| p.id.clone()).collect();
        let route = reconstruct_route(&token(1), &token(4), &ids, &pools).unwrap();

        let handle = encode_route(&route).unwrap();
        let decoded = decode_route(&token(1), &token(4), &handle, &pools).unwrap();
        assert_eq!(decoded.pool_ids(), route.pool_ids());
        assert_eq!(decoded.tokens, route.tokens);
    }

    #[test]
    fn test_handle_survives_reserve_changes() {
        let pools = chain();
        let handle = RouteHandle::Pools(vec![pool_id(1), pool_id(2)]).encode().unwrap();

        let mut refreshed = chain();
        refreshed[0].reserve_a = BigUint::from(7u32);
        let route = decode_route(&token(1), &token(3), &handle, &refreshed).unwrap();
        assert_eq!(route.pools[0].reserve_a, BigUint::from(7u32));
        assert_ne!(route.pools[0], pools[0]);
    }

    #[test]
    fn test_missing_pool_is_no_route() {
        let pools = chain();
        let handle = RouteHandle::Pools(vec![pool_id(1), pool_id(9)]).encode().unwrap();
        assert!(decode_route(&token(1), &token(3), &handle, &pools).is_none());
    }

    #[test]
    fn test_disconnected_chain_is_no_route() {
        let pools = chain();
        // pool 3 does not touch token 2
        let handle = RouteHandle::Pools(vec![pool_id(1), pool_id(3)]).encode().unwrap();
        assert!(decode_route(&token(1), &token(4), &handle, &pools).is_none());

        // connects, but ends at the wrong token
        let handle = RouteHandle::Pools(vec![pool_id(1), pool_id(2)]).encode().unwrap();
        assert!(decode_route(&token(1), &token(4), &handle, &pools).is_none());

        // starts from the wrong token
        assert!(decode_route(&token(2), &token(3), &handle, &pools).is_none());
    }

    #[test]
    fn test_revisiting_token_is_no_route() {
        let pools = chain();
        let handle = RouteHandle::Pools(vec![pool_id(1), pool_id(1)]).encode().unwrap();
        assert!(decode_route(&token(1), &token(1), &handle, &pools).is_none());
    }

    #[test]
    fn test_malformed_handles() {
        assert_eq!(RouteHandle::decode("zz"), Err(HandleError::InvalidHex));
        assert_eq!(RouteHandle::decode("01"), Err(HandleError::Truncated));
        assert_eq!(RouteHandle::decode("020000"), Err(HandleError::UnsupportedVersion(2)));
        assert_eq!(RouteHandle::decode("010700"), Err(HandleError::UnknownKind(7)));
        assert_eq!(RouteHandle::decode("010000"), Err(HandleError::Empty));
        assert_eq!(RouteHandle::decode("01000105"), Err(HandleError::Truncated));
        assert_eq!(RouteHandle::decode("010100ff"), Err(HandleError::TrailingBytes(1)));
        assert!(decode_route(&token(1), &token(2), "not a handle", &chain()).is_none());
    }

    #[test]
    fn test_onchain_direct_variant() {
        let handle = RouteHandle::OnchainDirect.encode().unwrap();
        assert_eq!(handle, "010100");
        assert_eq!(RouteHandle::decode(&handle), Ok(RouteHandle::OnchainDirect));
        assert!(decode_route(&token(1), &token(2), &handle, &chain()).is_none());
    }

    #[test]
    fn test_onchain_direct_rejects_nonzero_count() {
        assert_eq!(
            RouteHandle::decode("010105"),
            Err(HandleError::UnexpectedCount(5))
        );
        assert_eq!(
            RouteHandle::decode("010101"),
            Err(HandleError::UnexpectedCount(1))
        );
    }

    #[test]
    fn test_decode_normalizes_case() {
        let pools = chain();
        let upper = pool_id(1).to_uppercase().replacen("0X", "0x", 1);
        let handle = RouteHandle::Pools(vec![upper]).encode().unwrap();
        let route = decode_route(&token(1), &token(2), &handle, &pools).unwrap();
        assert_eq!(route.pool_ids(), vec![pool_id(1)]);
    }

    #[test]
    fn test_empty_route_does_not_encode() {
        assert_eq!(RouteHandle::Pools(vec![]).encode(), Err(HandleError::Empty));
    }
}
