//! Decimal-Safe Amount Arithmetic
//!
//! Conversions between human decimal amounts and fixed-point on-chain base
//! units across heterogeneous token decimal counts. All conversions floor
//! toward zero; a positive decimal amount that would round to zero base
//! units is bumped to one smallest unit so sub-smallest-unit liquidity
//! never silently vanishes.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

use crate::error::{ProvisionError, Result};
use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Maximum token decimals we can scale through `Decimal` (28 significant
/// digit mantissa).
pub const MAX_DECIMALS: u8 = 28;

/// Convert a decimal amount to integer base units at `decimals`, flooring
/// toward zero. Negative amounts are rejected.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256> {
    if amount.is_sign_negative() {
        return Err(ProvisionError::PriceComputationError(format!(
            "negative amount {amount} cannot be converted to base units"
        )));
    }
    if decimals > MAX_DECIMALS {
        return Err(ProvisionError::PriceComputationError(format!(
            "unsupported token decimals: {decimals}"
        )));
    }

    let scale = Decimal::from(10i128.pow(decimals as u32));
    let scaled = amount.checked_mul(scale).ok_or_else(|| {
        ProvisionError::PriceComputationError(format!(
            "amount {amount} overflows at {decimals} decimals"
        ))
    })?;

    let units = scaled.trunc().to_u128().ok_or_else(|| {
        ProvisionError::PriceComputationError(format!(
            "amount {amount} exceeds u128 base-unit range"
        ))
    })?;

    Ok(U256::from(units))
}

/// Convert integer base units back to a decimal amount at `decimals`.
pub fn from_base_units(units: U256, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(ProvisionError::PriceComputationError(format!(
            "unsupported token decimals: {decimals}"
        )));
    }
    let raw = u128::try_from(units).map_err(|_| {
        ProvisionError::PriceComputationError(format!(
            "base-unit amount {units} exceeds u128 range"
        ))
    })?;
    Decimal::try_from_i128_with_scale(raw as i128, decimals as u32).map_err(|e| {
        ProvisionError::PriceComputationError(format!(
            "base-unit amount {raw} not representable: {e}"
        ))
    })
}

/// Bump a zero base-unit amount to one smallest unit when the decimal input
/// was positive. Returns the amount unchanged otherwise.
pub fn at_least_one(units: U256, decimal_input: Decimal) -> U256 {
    if units.is_zero() && decimal_input > Decimal::ZERO {
        U256::from(1)
    } else {
        units
    }
}

/// Rescale a base-unit amount from one token's decimals to another's,
/// flooring toward zero on scale-down. A positive amount that scales down
/// to zero is bumped to one smallest unit (a zero-amount split can never
/// satisfy a requirement).
pub fn scale_units(units: U256, from_decimals: u8, to_decimals: u8) -> U256 {
    if units.is_zero() {
        return units;
    }
    let scaled = if to_decimals >= from_decimals {
        let factor = U256::from(10u64).pow(U256::from(to_decimals - from_decimals));
        units * factor
    } else {
        let factor = U256::from(10u64).pow(U256::from(from_decimals - to_decimals));
        units / factor
    };
    if scaled.is_zero() {
        U256::from(1)
    } else {
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_base_units_18_decimals() {
        let units = to_base_units(dec!(1.5), 18).unwrap();
        assert_eq!(units, U256::from(1_500_000_000_000_000_000u128));
    }

    #[test]
    fn test_to_base_units_floors_toward_zero() {
        // 1.9 at 0 decimals truncates to 1
        assert_eq!(to_base_units(dec!(1.9), 0).unwrap(), U256::from(1));
        // Exact half-unit boundary at 6 decimals: 0.0000005 -> 0 (floor)
        assert_eq!(to_base_units(dec!(0.0000005), 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_to_base_units_rejects_negative() {
        assert!(to_base_units(dec!(-1), 18).is_err());
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let original = dec!(0.021735);
        let units = to_base_units(original, 6).unwrap();
        let back = from_base_units(units, 6).unwrap();
        let diff = (original - back).abs();
        assert!(diff <= Decimal::try_from_i128_with_scale(1, 6).unwrap());
    }

    #[test]
    fn test_round_trip_exact() {
        let original = dec!(123.456789);
        let units = to_base_units(original, 6).unwrap();
        assert_eq!(from_base_units(units, 6).unwrap(), original);
    }

    #[test]
    fn test_at_least_one_bumps_positive_zero() {
        assert_eq!(at_least_one(U256::ZERO, dec!(0.0000001)), U256::from(1));
    }

    #[test]
    fn test_at_least_one_keeps_true_zero() {
        assert_eq!(at_least_one(U256::ZERO, Decimal::ZERO), U256::ZERO);
    }

    #[test]
    fn test_scale_units_up() {
        // 6 -> 18 decimals: multiply by 10^12
        assert_eq!(
            scale_units(U256::from(5), 6, 18),
            U256::from(5_000_000_000_000u128)
        );
    }

    #[test]
    fn test_scale_units_down_floors() {
        // 18 -> 6 decimals: divide by 10^12, floor
        assert_eq!(
            scale_units(U256::from(1_999_999_999_999u128), 18, 6),
            U256::from(1)
        );
    }

    #[test]
    fn test_scale_units_down_bumps_zero() {
        // Positive amount that floors to zero becomes one smallest unit
        assert_eq!(scale_units(U256::from(999), 18, 6), U256::from(1));
    }

    #[test]
    fn test_scale_units_same_decimals() {
        assert_eq!(scale_units(U256::from(42), 18, 18), U256::from(42));
    }
}
