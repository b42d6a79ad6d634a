//! AMM Calculator
//!
//! Swap math using constant product formula (x * y = k), in integer floor
//! arithmetic over arbitrary-precision amounts.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::constants::fees::BPS_DENOM;

/// Result of pricing one pool traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopQuote {
    pub amount_out: BigUint,
    /// `None` when the output is zero and the execution price is undefined
    pub price_impact_bps: Option<u32>,
}

/// `amount_in * (10000 - fee_bps) / 10000`, floored
pub fn amount_after_fee(amount_in: &BigUint, fee_bps: u32) -> BigUint {
    let keep = BPS_DENOM.saturating_sub(fee_bps);
    amount_in * BigUint::from(keep) / BigUint::from(BPS_DENOM)
}

/// Price a single hop.
///
/// Formula: output = after_fee * reserve_out / (reserve_in + after_fee)
///
/// Returns `None` when either reserve is zero.
pub fn quote_single_hop(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    fee_bps: u32,
    amount_in: &BigUint,
) -> Option<HopQuote> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return None;
    }

    let after_fee = amount_after_fee(amount_in, fee_bps);
    let denominator = reserve_in + &after_fee;
    let amount_out = &after_fee * reserve_out / denominator;
    let price_impact_bps = price_impact_bps(reserve_in, reserve_out, amount_in, &amount_out);

    Some(HopQuote {
        amount_out,
        price_impact_bps,
    })
}

/// Deviation of the execution price from the pool's pre-trade price, in bps.
///
/// Both prices are expressed as input per output:
/// `(amount_in / amount_out - reserve_in / reserve_out) / (reserve_in / reserve_out)`,
/// which reduces to `amount_in * reserve_out / (amount_out * reserve_in) - 1`.
/// Rounded half up and floored at 0. `None` when `amount_out` is zero.
pub fn price_impact_bps(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    amount_in: &BigUint,
    amount_out: &BigUint,
) -> Option<u32> {
    if amount_out.is_zero() || reserve_in.is_zero() {
        return None;
    }

    let numerator = amount_in * reserve_out;
    let denominator = amount_out * reserve_in;
    if numerator <= denominator {
        return Some(0);
    }

    let excess = numerator - &denominator;
    let two = BigUint::from(2u32);
    let scaled = (excess * BigUint::from(BPS_DENOM) * &two + &denominator) / (denominator * two);
    Some(scaled.to_u32().unwrap_or(u32::MAX))
}

/// Minimum acceptable output: `expected * (10000 - slippage_bps) / 10000`, floored
pub fn apply_slippage(expected: &BigUint, slippage_bps: u32) -> BigUint {
    let keep = BPS_DENOM.saturating_sub(slippage_bps);
    expected * BigUint::from(keep) / BigUint::from(BPS_DENOM)
}
