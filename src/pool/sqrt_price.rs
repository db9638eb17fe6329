//! Square-Root Price Encoding and Tick Math
//!
//! The AMM stores a pool's price as sqrt(token1/token0) in Q64.96 fixed
//! point (sqrtPriceX96). Initialization encodes the target ratio from the
//! raw base-unit amounts; verification decodes the live tick back into a
//! decimal-adjusted price.
//!
//! References:
//!     - Uniswap V3 TickMath.sol (MIN/MAX tick and sqrt ratio bounds)
//!     - Uniswap SDK encodeSqrtRatioX96
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::error::{ProvisionError, Result};
use alloy::primitives::aliases::{I24, U160};
use alloy::primitives::{U256, U512};

/// Tick bounds from Uniswap V3 TickMath
pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// getSqrtRatioAtTick(MIN_TICK)
pub const MIN_SQRT_RATIO: u64 = 4_295_128_739;

/// Encode sqrt(amount1/amount0) × 2^96 from raw base-unit amounts.
///
/// The ratio is computed at full precision ((amount1 << 192) / amount0 in
/// 512-bit space) so the squared result reproduces the target price
/// bit-for-bit within one ulp of the fixed-point representation.
pub fn encode_sqrt_ratio_x96(amount1: U256, amount0: U256) -> Result<U160> {
    if amount0.is_zero() {
        return Err(ProvisionError::PriceComputationError(
            "cannot encode sqrt ratio with zero amount0".into(),
        ));
    }
    if amount1.is_zero() {
        return Err(ProvisionError::PriceComputationError(
            "cannot encode sqrt ratio with zero amount1".into(),
        ));
    }

    let ratio = (U512::from(amount1) << 192) / U512::from(amount0);
    let sqrt = integer_sqrt(ratio);

    if sqrt < U512::from(MIN_SQRT_RATIO) || sqrt >= (U512::from(1u8) << 160) {
        return Err(ProvisionError::PriceComputationError(format!(
            "sqrt price {sqrt} outside representable tick range"
        )));
    }
    Ok(sqrt.to::<U160>())
}

/// Integer square root (Babylonian method), floor semantics.
fn integer_sqrt(x: U512) -> U512 {
    if x.is_zero() {
        return x;
    }
    let mut z = x;
    let mut y = (x >> 1) + U512::from(1u8);
    while y < z {
        z = y;
        y = (x / y + y) >> 1;
    }
    z
}

/// Price of token0 in terms of token1 from a tick, adjusted for decimals:
/// price = 1.0001^tick × 10^(decimals0 − decimals1)
pub fn price_from_tick(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    let base: f64 = 1.0001;
    base.powi(tick) * 10f64.powi(decimals0 as i32 - decimals1 as i32)
}

/// Largest spacing multiple ≤ tick.
pub fn align_down(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

/// Smallest spacing multiple ≥ tick.
pub fn align_up(tick: i32, spacing: i32) -> i32 {
    let down = align_down(tick, spacing);
    if down == tick {
        tick
    } else {
        down + spacing
    }
}

/// Range centered on the current tick, ± `steps` spacing units, bounds
/// aligned outward. Falls back to ±1 spacing around the aligned current
/// tick when the centered range collapses to an empty interval.
pub fn centered_range(current_tick: i32, spacing: i32, steps: i32) -> (i32, i32) {
    let half_width = spacing.saturating_mul(steps.max(0));
    let mut lower = align_down(current_tick - half_width, spacing);
    let mut upper = align_up(current_tick + half_width, spacing);

    if lower >= upper {
        let center = align_down(current_tick, spacing);
        lower = center - spacing;
        upper = center + spacing;
    }

    (lower.max(align_up(MIN_TICK, spacing)), upper.min(align_down(MAX_TICK, spacing)))
}

/// Full-range position bounds aligned to spacing.
pub fn full_range(spacing: i32) -> (i32, i32) {
    (align_up(MIN_TICK, spacing), align_down(MAX_TICK, spacing))
}

/// Narrow an i32 tick to the contract's int24 argument type. Ticks are
/// bounded by MIN_TICK/MAX_TICK which fit comfortably in 24 bits.
pub fn tick_to_i24(tick: i32) -> I24 {
    I24::try_from(tick.clamp(MIN_TICK, MAX_TICK)).unwrap_or(I24::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q96: u128 = 1 << 96;

    #[test]
    fn test_encode_one_to_one() {
        let sqrt = encode_sqrt_ratio_x96(U256::from(1), U256::from(1)).unwrap();
        assert_eq!(U256::from(sqrt), U256::from(Q96));
    }

    #[test]
    fn test_encode_price_four() {
        // price = 4 -> sqrt = 2 -> 2 * 2^96
        let sqrt = encode_sqrt_ratio_x96(U256::from(4), U256::from(1)).unwrap();
        assert_eq!(U256::from(sqrt), U256::from(2 * Q96));
    }

    #[test]
    fn test_encode_fractional_price() {
        // price = 1/4 -> sqrt = 1/2 -> 2^96 / 2
        let sqrt = encode_sqrt_ratio_x96(U256::from(1), U256::from(4)).unwrap();
        assert_eq!(U256::from(sqrt), U256::from(Q96 / 2));
    }

    #[test]
    fn test_encode_large_amounts() {
        // 18-decimal wei amounts at price 0.5
        let a1 = U256::from(1_000_000_000_000_000_000u128);
        let a0 = U256::from(2_000_000_000_000_000_000u128);
        let sqrt = encode_sqrt_ratio_x96(a1, a0).unwrap();
        // sqrt(0.5) * 2^96, within one ulp
        let expected = (0.5f64.sqrt() * Q96 as f64) as u128;
        let got = U256::from(sqrt);
        let diff = got.abs_diff(U256::from(expected));
        assert!(diff <= U256::from(expected / 1_000_000_000));
    }

    #[test]
    fn test_encode_rejects_zero() {
        assert!(encode_sqrt_ratio_x96(U256::from(1), U256::ZERO).is_err());
        assert!(encode_sqrt_ratio_x96(U256::ZERO, U256::from(1)).is_err());
    }

    #[test]
    fn test_align_down_up() {
        assert_eq!(align_down(67, 10), 60);
        assert_eq!(align_up(67, 10), 70);
        assert_eq!(align_down(-67, 10), -70);
        assert_eq!(align_up(-67, 10), -60);
        assert_eq!(align_down(60, 10), 60);
        assert_eq!(align_up(60, 10), 60);
    }

    #[test]
    fn test_centered_range() {
        let (lower, upper) = centered_range(1234, 60, 10);
        assert_eq!(lower.rem_euclid(60), 0);
        assert_eq!(upper.rem_euclid(60), 0);
        assert_eq!(lower, align_down(1234 - 600, 60));
        assert_eq!(upper, align_up(1234 + 600, 60));
        assert!(lower < upper);
    }

    #[test]
    fn test_centered_range_collapse_fallback() {
        // On-grid tick with steps = 0: both bounds align to the tick itself,
        // the interval is empty, and the ±1 spacing fallback fires
        let (lower, upper) = centered_range(120, 60, 0);
        assert_eq!((lower, upper), (60, 180));
    }

    #[test]
    fn test_centered_range_zero_steps_off_grid() {
        // Off-grid tick with steps = 0: outward alignment alone already
        // yields a one-spacing interval, no fallback needed
        let (lower, upper) = centered_range(100, 60, 0);
        assert_eq!((lower, upper), (60, 120));
    }

    #[test]
    fn test_full_range() {
        assert_eq!(full_range(60), (-887_220, 887_220));
        assert_eq!(full_range(1), (MIN_TICK, MAX_TICK));
    }

    #[test]
    fn test_price_from_tick() {
        assert!((price_from_tick(0, 18, 18) - 1.0).abs() < 1e-12);
        // one tick = one basis point of a percent
        assert!((price_from_tick(1, 18, 18) - 1.0001).abs() < 1e-12);
        // decimal adjustment: 18/6 pair shifts by 10^12
        assert!((price_from_tick(0, 18, 6) - 1e12).abs() < 1.0);
    }
}
