//! Router, pair, and token contract bindings
//!
//! Calls are encoded and return data decoded through `sol!`-generated types;
//! everything here is pure so it can be exercised without a node.

use alloy::primitives::{Address as EvmAddress, Bytes, Uint, U256};
use alloy::sol;
use alloy::sol_types::{Panic, Revert, SolCall, SolError};
use num_bigint::BigUint;
use router_core::{Address, ChainError};

use crate::{Result, SwapCall, SwapMethod};

sol! {
    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external payable returns (uint256[] memory amounts);
    }
}

pub fn to_evm_address(addr: &Address) -> Result<EvmAddress> {
    addr.as_str()
        .parse::<EvmAddress>()
        .map_err(|e| ChainError::Encode(format!("bad address {}: {}", addr, e)))
}

fn to_evm_path(path: &[Address]) -> Result<Vec<EvmAddress>> {
    path.iter().map(to_evm_address).collect()
}

pub fn to_u256(value: &BigUint) -> Result<U256> {
    U256::try_from_be_slice(&value.to_bytes_be())
        .ok_or_else(|| ChainError::Encode(format!("{} does not fit in uint256", value)))
}

pub fn to_biguint<const BITS: usize, const LIMBS: usize>(value: Uint<BITS, LIMBS>) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes_vec())
}

/// Gas fees travel as `u128` in transaction requests
pub fn to_gas_u128(value: &BigUint) -> Result<u128> {
    u128::try_from(value).map_err(|_| ChainError::Encode(format!("gas fee {} too large", value)))
}

fn decode_error(call: &str, e: impl std::fmt::Display) -> ChainError {
    ChainError::ParseError(format!("{} returned malformed data: {}", call, e))
}

pub fn encode_get_reserves() -> Bytes {
    IUniswapV2Pair::getReservesCall {}.abi_encode().into()
}

pub fn encode_token0() -> Bytes {
    IUniswapV2Pair::token0Call {}.abi_encode().into()
}

pub fn encode_token1() -> Bytes {
    IUniswapV2Pair::token1Call {}.abi_encode().into()
}

/// `(reserve0, reserve1)` from `getReserves()` return data
pub fn decode_reserves(data: &[u8]) -> Result<(BigUint, BigUint)> {
    let ret = IUniswapV2Pair::getReservesCall::abi_decode_returns(data)
        .map_err(|e| decode_error("getReserves", e))?;
    Ok((to_biguint(ret.reserve0), to_biguint(ret.reserve1)))
}

pub fn decode_token(data: &[u8]) -> Result<Address> {
    let token = IUniswapV2Pair::token0Call::abi_decode_returns(data)
        .map_err(|e| decode_error("token0/token1", e))?;
    Ok(Address::from(token))
}

pub fn encode_allowance(owner: &Address, spender: &Address) -> Result<Bytes> {
    Ok(IERC20::allowanceCall {
        owner: to_evm_address(owner)?,
        spender: to_evm_address(spender)?,
    }
    .abi_encode()
    .into())
}

pub fn decode_allowance(data: &[u8]) -> Result<BigUint> {
    let allowance = IERC20::allowanceCall::abi_decode_returns(data)
        .map_err(|e| decode_error("allowance", e))?;
    Ok(to_biguint(allowance))
}

pub fn encode_approve(spender: &Address, amount: &BigUint) -> Result<Bytes> {
    Ok(IERC20::approveCall {
        spender: to_evm_address(spender)?,
        amount: to_u256(amount)?,
    }
    .abi_encode()
    .into())
}

pub fn encode_amounts_out(amount_in: &BigUint, path: &[Address]) -> Result<Bytes> {
    Ok(IUniswapV2Router02::getAmountsOutCall {
        amountIn: to_u256(amount_in)?,
        path: to_evm_path(path)?,
    }
    .abi_encode()
    .into())
}

/// Final amount of the path from `getAmountsOut` return data
pub fn decode_amounts_out(data: &[u8]) -> Result<BigUint> {
    let amounts = IUniswapV2Router02::getAmountsOutCall::abi_decode_returns(data)
        .map_err(|e| decode_error("getAmountsOut", e))?;
    amounts
        .last()
        .map(|amount| to_biguint(*amount))
        .ok_or_else(|| ChainError::ParseError("getAmountsOut returned no amounts".into()))
}

/// Calldata and call value for a swap
pub fn encode_swap(call: &SwapCall) -> Result<(Bytes, Option<U256>)> {
    let amount_in = to_u256(&call.amount_in)?;
    let amount_out_min = to_u256(&call.min_out)?;
    let path = to_evm_path(&call.path)?;
    let to = to_evm_address(&call.recipient)?;
    let deadline = U256::from(call.deadline);

    let encoded = match call.method {
        SwapMethod::ExactTokensForTokens => (
            IUniswapV2Router02::swapExactTokensForTokensCall {
                amountIn: amount_in,
                amountOutMin: amount_out_min,
                path,
                to,
                deadline,
            }
            .abi_encode(),
            None,
        ),
        SwapMethod::ExactTokensForNative => (
            IUniswapV2Router02::swapExactTokensForETHCall {
                amountIn: amount_in,
                amountOutMin: amount_out_min,
                path,
                to,
                deadline,
            }
            .abi_encode(),
            None,
        ),
        SwapMethod::ExactNativeForTokens => (
            IUniswapV2Router02::swapExactETHForTokensCall {
                amountOutMin: amount_out_min,
                path,
                to,
                deadline,
            }
            .abi_encode(),
            Some(amount_in),
        ),
    };
    Ok((encoded.0.into(), encoded.1))
}

/// Human-readable reason from `Error(string)` or `Panic(uint256)` revert data
pub fn revert_reason(data: &[u8]) -> Option<String> {
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    Panic::abi_decode(data)
        .ok()
        .map(|panic| format!("panic code {}", panic.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolValue;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn word(value: u64) -> Vec<u8> {
        U256::from(value).to_be_bytes::<32>().to_vec()
    }

    #[test]
    fn test_encode_allowance_call() {
        let data = encode_allowance(&addr(1), &addr(2)).unwrap();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &IERC20::allowanceCall::SELECTOR);
        assert_eq!(data[4 + 31], 1);
        assert_eq!(data[4 + 63], 2);
    }

    #[test]
    fn test_native_in_swap_carries_value() {
        let call = SwapCall {
            router: addr(9),
            method: SwapMethod::ExactNativeForTokens,
            amount_in: BigUint::from(5_000u32),
            min_out: BigUint::from(4_000u32),
            path: vec![addr(1), addr(2)],
            recipient: addr(7),
            deadline: 1_700_000_000,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        };
        let (data, value) = encode_swap(&call).unwrap();
        assert_eq!(&data[..4], &IUniswapV2Router02::swapExactETHForTokensCall::SELECTOR);
        assert_eq!(value, Some(U256::from(5_000u32)));

        let tokens = SwapCall {
            method: SwapMethod::ExactTokensForTokens,
            ..call
        };
        let (data, value) = encode_swap(&tokens).unwrap();
        assert_eq!(&data[..4], &IUniswapV2Router02::swapExactTokensForTokensCall::SELECTOR);
        assert!(value.is_none());
    }

    #[test]
    fn test_decode_amounts_out_takes_last() {
        let data = vec![U256::from(100u32), U256::from(95u32)].abi_encode();
        assert_eq!(decode_amounts_out(&data).unwrap(), BigUint::from(95u32));

        let empty = Vec::<U256>::new().abi_encode();
        assert!(decode_amounts_out(&empty).is_err());
    }

    #[test]
    fn test_hostile_array_offset_is_parse_error() {
        let data = word(u64::MAX - 31);
        assert!(matches!(decode_amounts_out(&data), Err(ChainError::ParseError(_))));

        let mut huge_len = word(32);
        huge_len.extend(word(u64::MAX));
        assert!(matches!(decode_amounts_out(&huge_len), Err(ChainError::ParseError(_))));
    }

    #[test]
    fn test_decode_reserves() {
        let data = (U256::from(1_000u32), U256::from(2_000u32), U256::from(7u32)).abi_encode();
        let (r0, r1) = decode_reserves(&data).unwrap();
        assert_eq!(r0, BigUint::from(1_000u32));
        assert_eq!(r1, BigUint::from(2_000u32));
        assert!(decode_reserves(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_decode_token_normalizes() {
        let evm: EvmAddress = "0x00000000000000000000000000000000000000AB".parse().unwrap();
        let token = decode_token(&evm.abi_encode()).unwrap();
        assert_eq!(token.as_str(), "0x00000000000000000000000000000000000000ab");
    }

    #[test]
    fn test_revert_reason() {
        let data = Revert {
            reason: "UniswapV2Router: EXPIRED".to_string(),
        }
        .abi_encode();
        assert_eq!(revert_reason(&data).as_deref(), Some("UniswapV2Router: EXPIRED"));
        assert!(revert_reason(&[0u8; 4]).is_none());
    }

    #[test]
    fn test_hostile_revert_payload_is_ignored() {
        let mut data = Revert::SELECTOR.to_vec();
        data.extend(word(u64::MAX));
        assert!(revert_reason(&data).is_none());

        let mut data = Revert::SELECTOR.to_vec();
        data.extend(word(32));
        data.extend(word(u64::MAX));
        assert!(revert_reason(&data).is_none());
    }

    #[test]
    fn test_oversized_amount_rejected() {
        let too_big = BigUint::from(1u32) << 256;
        assert!(matches!(to_u256(&too_big), Err(ChainError::Encode(_))));
        assert!(encode_approve(&addr(1), &too_big).is_err());
        assert!(to_gas_u128(&(BigUint::from(1u32) << 128)).is_err());
    }

    #[test]
    fn test_bad_address_rejected() {
        assert!(to_evm_address(&Address::new("0x01")).is_err());
    }
}
