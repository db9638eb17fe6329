//! Canonical Pair Ordering
//!
//! The AMM orders every pair by ascending token address; the smaller address
//! becomes token0 inside the pool regardless of which token the caller
//! considers logically primary. This module is the single point of truth
//! for that mapping — pool initialization, mint amount assignment, and
//! price verification all convert through here rather than re-deriving the
//! comparison inline.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

use alloy::primitives::{Address, U256};

/// Result of ordering a logical (token0, token1) pair into AMM order.
/// Derived, never persisted; recompute for every pair comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOrdering {
    pub amm_token0: Address,
    pub amm_token1: Address,
    /// True when the caller's logical order is inverted in the pool: any
    /// logical price must become 1/price and amount0/amount1 must swap
    /// before touching AMM-facing calls.
    pub needs_reorder: bool,
}

/// Order two token addresses the way the AMM will.
///
/// Address comparison is bytewise, which for hex addresses is exactly the
/// case-insensitive lexicographic comparison the AMM factory performs.
pub fn order(logical_token0: Address, logical_token1: Address) -> CanonicalOrdering {
    if logical_token0 <= logical_token1 {
        CanonicalOrdering {
            amm_token0: logical_token0,
            amm_token1: logical_token1,
            needs_reorder: false,
        }
    } else {
        CanonicalOrdering {
            amm_token0: logical_token1,
            amm_token1: logical_token0,
            needs_reorder: true,
        }
    }
}

impl CanonicalOrdering {
    /// Convert a price expressed in logical order (logical token1 per
    /// logical token0) into AMM order. Returns 0.0 for a zero price rather
    /// than dividing by it; callers validate prices upstream.
    pub fn to_amm_price(&self, logical_price: f64) -> f64 {
        if self.needs_reorder {
            if logical_price == 0.0 {
                0.0
            } else {
                1.0 / logical_price
            }
        } else {
            logical_price
        }
    }

    /// Convert a price read from the pool (AMM token1 per AMM token0) back
    /// into the caller's logical order.
    pub fn to_logical_price(&self, amm_price: f64) -> f64 {
        // Inversion is its own inverse
        self.to_amm_price(amm_price)
    }

    /// Arrange logical (amount0, amount1) into AMM (amount0, amount1).
    pub fn to_amm_amounts(&self, amount0: U256, amount1: U256) -> (U256, U256) {
        if self.needs_reorder {
            (amount1, amount0)
        } else {
            (amount0, amount1)
        }
    }

    /// Arrange logical (decimals0, decimals1) into AMM order.
    pub fn to_amm_decimals(&self, decimals0: u8, decimals1: u8) -> (u8, u8) {
        if self.needs_reorder {
            (decimals1, decimals0)
        } else {
            (decimals0, decimals1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn addr(s: &str) -> Address {
        Address::from_str(s).unwrap()
    }

    #[test]
    fn test_order_ascending() {
        let a = addr("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        let b = addr("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
        let o = order(a, b);
        assert_eq!(o.amm_token0, a);
        assert_eq!(o.amm_token1, b);
        assert!(!o.needs_reorder);
    }

    #[test]
    fn test_order_commutative() {
        let a = addr("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        let b = addr("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
        let fwd = order(a, b);
        let rev = order(b, a);
        assert_eq!(fwd.amm_token0, rev.amm_token0);
        assert_eq!(fwd.amm_token1, rev.amm_token1);
        assert!(!fwd.needs_reorder);
        assert!(rev.needs_reorder);
    }

    #[test]
    fn test_price_inversion_round_trip() {
        let a = addr("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
        let b = addr("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        let o = order(a, b);
        assert!(o.needs_reorder);
        let logical = 0.025;
        let amm = o.to_amm_price(logical);
        assert!((amm - 40.0).abs() < 1e-12);
        assert!((o.to_logical_price(amm) - logical).abs() < 1e-12);
    }

    #[test]
    fn test_price_unchanged_when_in_order() {
        let a = addr("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        let b = addr("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
        let o = order(a, b);
        assert_eq!(o.to_amm_price(0.025), 0.025);
    }

    #[test]
    fn test_amount_swap() {
        let a = addr("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
        let b = addr("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        let o = order(a, b);
        let (a0, a1) = o.to_amm_amounts(U256::from(1), U256::from(2));
        assert_eq!(a0, U256::from(2));
        assert_eq!(a1, U256::from(1));
        let (d0, d1) = o.to_amm_decimals(18, 6);
        assert_eq!((d0, d1), (6, 18));
    }

    #[test]
    fn test_case_insensitive_comparison() {
        // Mixed-case checksummed input orders the same as lowercase
        let a = addr("0xaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaA");
        let b = addr("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB");
        let o = order(b, a);
        assert_eq!(o.amm_token0, a);
        assert!(o.needs_reorder);
    }
}
