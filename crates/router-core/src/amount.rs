//! Base-unit amount conversion
//!
//! Human-readable decimal strings are converted to integer base units using a
//! token's decimal precision. Parsing is strict: digits, at most one dot, no
//! sign, no exponent, and never more fractional digits than the token carries.

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

use crate::errors::{ErrorKind, SwapError};

/// Decimals of the small fee denomination (gwei) relative to the native unit's base (wei)
pub const GAS_FEE_DECIMALS: u8 = 9;

/// Amount parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount '{0}' is not a plain decimal number")]
    Malformed(String),

    #[error("Amount '{value}' has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u8 },
}

/// Convert a decimal string such as `"1.25"` into base units.
pub fn parse_units(value: &str, decimals: u8) -> Result<BigUint, AmountError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
        return Err(AmountError::Malformed(value.to_string()));
    }
    if value.ends_with('.') {
        return Err(AmountError::Malformed(value.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooPrecise {
            value: value.to_string(),
            decimals,
        });
    }

    let mut padded = String::with_capacity(whole.len() + decimals as usize);
    padded.push_str(whole);
    padded.push_str(fraction);
    for _ in fraction.len()..decimals as usize {
        padded.push('0');
    }

    BigUint::parse_bytes(padded.as_bytes(), 10).ok_or_else(|| AmountError::Malformed(value.to_string()))
}

/// Render base units as a decimal string, trimming trailing fractional zeros.
pub fn format_units(value: &BigUint, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_str_radix(10);
    }
    let scale = BigUint::from(10u32).pow(decimals as u32);
    let whole = value / &scale;
    let fraction = value % &scale;
    if fraction.is_zero() {
        return whole.to_str_radix(10);
    }
    let fraction = format!("{:0>width$}", fraction.to_str_radix(10), width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Parse a gas fee given in gwei into wei.
pub fn parse_gas_fee(field: &str, value: &str) -> Result<BigUint, SwapError> {
    parse_units(value, GAS_FEE_DECIMALS).map_err(|e| {
        SwapError::wrap(
            ErrorKind::GasFeeInvalid,
            format!("{} must be a decimal gwei value, got '{}'", field, value),
            e,
        )
    })
}

/// Serde helpers encoding `BigUint` as a decimal string
pub mod serde_decimal {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.trim().as_bytes(), 10)
            .ok_or_else(|| D::Error::custom(format!("invalid decimal integer '{}'", s)))
    }
}

/// Same as [`serde_decimal`] for optional values
pub mod serde_decimal_opt {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_str_radix(10)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigUint>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| {
            BigUint::parse_bytes(s.trim().as_bytes(), 10)
                .ok_or_else(|| D::Error::custom(format!("invalid decimal integer '{}'", s)))
        })
        .transpose()
    }
}
