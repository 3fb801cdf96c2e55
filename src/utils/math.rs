//! Mathematical utility functions

use alloy::primitives::U256;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::str::FromStr;

pub fn pow10(n: i32) -> Decimal {
    match n {
        0 => dec!(1),
        6 => dec!(1_000_000),
        18 => dec!(1_000_000_000_000_000_000),
        _ => {
            let mut result = dec!(1);
            if n > 0 {
                for _ in 0..n {
                    result *= dec!(10);
                }
            } else {
                for _ in 0..(-n) {
                    result /= dec!(10);
                }
            }
            result
        }
    }
}

/// Raw on-chain amount to a human-unit decimal. None when the raw value
/// exceeds what a Decimal can carry; callers treat that as "no data".
pub fn to_decimal(raw: U256, decimals: u32) -> Option<Decimal> {
    let value = Decimal::from_str(&raw.to_string()).ok()?;
    Some(value / pow10(decimals as i32))
}

/// Human-unit decimal to a raw on-chain amount, truncating dust below
/// one raw unit.
pub fn to_raw(amount: Decimal, decimals: u32) -> U256 {
    let scaled = (amount * pow10(decimals as i32)).trunc();
    if scaled <= dec!(0) {
        return U256::ZERO;
    }
    U256::from_str(&scaled.to_string()).unwrap_or(U256::ZERO)
}

pub fn wei_to_gwei(wei: u128) -> Decimal {
    Decimal::from_u128(wei).unwrap_or(Decimal::MAX) / dec!(1_000_000_000)
}

pub fn gwei_to_wei(gwei: Decimal) -> u128 {
    (gwei * dec!(1_000_000_000))
        .trunc()
        .to_u128()
        .unwrap_or(0)
}

pub fn wei_to_native(wei: u128) -> Decimal {
    Decimal::from_u128(wei).unwrap_or(Decimal::MAX) / pow10(18)
}
