//! Smart Router: Multi-Hop Route Discovery & Ranking
//!
//! Finds every acyclic swap path between two tokens across the known pools,
//! prices each one with the constant-product calculator, and ranks them.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::Address;

use crate::calculator::quote_single_hop;
use crate::state::{Pool, Route, RouteQuote};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An edge in the pool graph: leaving a token through `pool` towards `token_out`.
#[derive(Debug, Clone)]
pub struct PoolEdge<'a> {
    pub pool: &'a Pool,
    pub token_out: &'a Address,
}

/// Adjacency-list pool graph borrowed from a pool snapshot.
#[derive(Debug, Clone, Default)]
pub struct PoolGraph<'a> {
    pub adjacency: HashMap<&'a Address, Vec<PoolEdge<'a>>>,
    pub pool_count: usize,
}

/// One pending step of the depth-first search.
struct SearchFrame<'a> {
    token: &'a Address,
    pools: Vec<&'a Pool>,
    tokens: Vec<&'a Address>,
    visited: HashSet<&'a Address>,
}

// ---------------------------------------------------------------------------
// Step 1: Pool Graph & Path Finding
// ---------------------------------------------------------------------------

/// Build a pool graph from a pool snapshot.
///
/// Every pool adds edges token_a ↔ token_b. Edge lists keep snapshot order so
/// the search visits pools deterministically. No pools are pruned here.
pub fn build_pool_graph(pools: &[Pool]) -> PoolGraph<'_> {
    let mut adjacency: HashMap<&Address, Vec<PoolEdge<'_>>> = HashMap::new();

    for pool in pools {
        adjacency.entry(&pool.token_a).or_default().push(PoolEdge {
            pool,
            token_out: &pool.token_b,
        });
        adjacency.entry(&pool.token_b).or_default().push(PoolEdge {
            pool,
            token_out: &pool.token_a,
        });
    }

    PoolGraph {
        adjacency,
        pool_count: pools.len(),
    }
}

/// Find all acyclic paths from `token_in` to `token_out` using at most `max_hops` pools.
///
/// Uses an explicit stack of (token, path, visited) frames, so the depth is
/// bounded by `max_hops` rather than the call stack. A token never appears
/// twice in a path.
pub fn find_paths(
    graph: &PoolGraph<'_>,
    token_in: &Address,
    token_out: &Address,
    max_hops: usize,
) -> Vec<Route> {
    let mut results = Vec::new();
    if token_in == token_out || max_hops == 0 {
        return results;
    }

    // Start from the graph's own key so every frame borrows from the snapshot
    let Some((start, _)) = graph.adjacency.get_key_value(token_in) else {
        return results;
    };

    let mut stack = vec![SearchFrame {
        token: *start,
        pools: Vec::new(),
        tokens: vec![*start],
        visited: HashSet::from([*start]),
    }];

    while let Some(frame) = stack.pop() {
        let Some(edges) = graph.adjacency.get(frame.token) else {
            continue;
        };

        let mut children = Vec::new();
        for edge in edges {
            if frame.visited.contains(edge.token_out) {
                continue;
            }

            let mut pools = frame.pools.clone();
            pools.push(edge.pool);
            let mut tokens = frame.tokens.clone();
            tokens.push(edge.token_out);

            if edge.token_out == token_out {
                results.push(Route {
                    pools: pools.into_iter().cloned().collect(),
                    tokens: tokens.into_iter().cloned().collect(),
                });
            } else if pools.len() < max_hops {
                let mut visited = frame.visited.clone();
                visited.insert(edge.token_out);
                children.push(SearchFrame {
                    token: edge.token_out,
                    pools,
                    tokens,
                    visited,
                });
            }
        }

        // Reversed so the first edge is explored first
        stack.extend(children.into_iter().rev());
    }

    results
}

/// Build the graph for `pools` and enumerate routes in one call.
pub fn discover_routes(
    pools: &[Pool],
    token_in: &Address,
    token_out: &Address,
    max_hops: usize,
) -> Vec<Route> {
    let graph = build_pool_graph(pools);
    let routes = find_paths(&graph, token_in, token_out, max_hops);
    tracing::debug!(
        "Discovered {} routes {} -> {} over {} pools (max_hops={})",
        routes.len(),
        token_in,
        token_out,
        graph.pool_count,
        max_hops
    );
    routes
}

// ---------------------------------------------------------------------------
// Step 2: Multi-Hop Quoting
// ---------------------------------------------------------------------------

/// Quote a route by chaining `quote_single_hop` through each pool.
///
/// Price impact is the plain sum of per-hop impacts, unknown if any hop's is.
/// Returns `None` if any hop has no quote or produces zero output.
pub fn quote_route(route: &Route, amount_in: &BigUint) -> Option<RouteQuote> {
    if route.pools.is_empty() || amount_in.is_zero() {
        return None;
    }

    let mut current = amount_in.clone();
    let mut impact: Option<u32> = Some(0);

    for (pool, token) in route.pools.iter().zip(&route.tokens) {
        let (reserve_in, reserve_out) = pool.reserves_for(token)?;
        let hop = quote_single_hop(reserve_in, reserve_out, pool.fee_bps, &current)?;
        if hop.amount_out.is_zero() {
            return None;
        }

        impact = match (impact, hop.price_impact_bps) {
            (Some(total), Some(step)) => Some(total.saturating_add(step)),
            _ => None,
        };
        current = hop.amount_out;
    }

    Some(RouteQuote {
        route: route.clone(),
        amount_in: amount_in.clone(),
        amount_out: current,
        price_impact_bps: impact,
        kind: route.kind(),
    })
}

/// Ordering used for ranking: higher output, then fewer hops, then lower impact.
///
/// Unknown impact sorts after any known impact.
pub fn compare_route_quotes(a: &RouteQuote, b: &RouteQuote) -> Ordering {
    let impact = |q: &RouteQuote| q.price_impact_bps.map_or(u64::MAX, u64::from);

    b.amount_out
        .cmp(&a.amount_out)
        .then_with(|| a.route.hops().cmp(&b.route.hops()))
        .then_with(|| impact(a).cmp(&impact(b)))
}

/// Sort quotes best-first. Stable, so equal quotes keep discovery order.
pub fn rank_route_quotes(quotes: &mut [RouteQuote]) {
    quotes.sort_by(compare_route_quotes);
}

/// Find and quote all routes, returning the top `max_routes` best-first.
pub fn find_best_routes(
    pools: &[Pool],
    token_in: &Address,
    token_out: &Address,
    amount_in: &BigUint,
    max_hops: usize,
    max_routes: usize,
) -> Vec<RouteQuote> {
    let mut quotes: Vec<RouteQuote> = discover_routes(pools, token_in, token_out, max_hops)
        .iter()
        .filter_map(|route| quote_route(route, amount_in))
        .collect();

    rank_route_quotes(&mut quotes);
    quotes.truncate(max_routes);
    quotes
}

/// Best quoted route, if any route prices.
pub fn find_best_route_quote(
    pools: &[Pool],
    token_in: &Address,
    token_out: &Address,
    amount_in: &BigUint,
    max_hops: usize,
) -> Option<RouteQuote> {
    find_best_routes(pools, token_in, token_out, amount_in, max_hops, 1)
        .into_iter()
        .next()
}

/// First pool in `pools` holding exactly the pair `a`/`b`.
pub fn find_direct_pool<'a>(pools: &'a [Pool], a: &Address, b: &Address) -> Option<&'a Pool> {
    pools
        .iter()
        .find(|p| (&p.token_a == a && &p.token_b == b) || (&p.token_a == b && &p.token_b == a))
}

/// Legacy single-pool quote through the first direct pool for the pair.
pub fn quote_direct(
    pools: &[Pool],
    token_in: &Address,
    token_out: &Address,
    amount_in: &BigUint,
) -> Option<RouteQuote> {
    let pool = find_direct_pool(pools, token_in, token_out)?;
    let route = Route {
        pools: vec![pool.clone()],
        tokens: vec![token_in.clone(), token_out.clone()],
    };
    quote_route(&route, amount_in)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
