//! Price Model
//!
//! Pure functions computing conditional token prices and the six target
//! pool configurations from (spotPrice, eventProbability, impact).
//!
//! ```text
//! yesPrice = spot × (1 + impact × (1 − p))
//! noPrice  = spot × (1 − impact × p)
//! ```
//!
//! which preserves p × yesPrice + (1 − p) × noPrice == spot.
//!
//! Pool targets (price = token1 per token0, logical order):
//!   1. YES-company / YES-currency   @ yesPrice
//!   2. NO-company  / NO-currency    @ noPrice
//!   3. YES-company / currency       @ spot × p
//!   4. NO-company  / currency       @ spot × (1 − p)
//!   5. YES-currency / currency      @ p
//!   6. NO-currency  / currency      @ 1 − p
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::amounts::{at_least_one, from_base_units, to_base_units};
use crate::error::{ProvisionError, Result};
use crate::types::{PoolConfig, ProposalInput, Token};
use alloy::primitives::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Liquidity used for a pool when the caller supplied no amount.
pub const DEFAULT_LIQUIDITY: &str = "0.001";

/// One leg of a pool, before token addresses are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Company,
    Currency,
    YesCompany,
    NoCompany,
    YesCurrency,
    NoCurrency,
}

/// A pool target produced by the price model: pure data, no addresses yet.
/// The orchestrator resolves legs against the proposal's token set and
/// materializes exact on-chain amounts.
#[derive(Debug, Clone)]
pub struct PoolTarget {
    pub pool_id: u8,
    pub name: String,
    pub leg0: Leg,
    pub leg1: Leg,
    /// token1 per token0, logical order
    pub target_price: f64,
    /// Decimal units of token1
    pub amount1: Decimal,
}

/// Conditional token prices for the YES and NO outcomes.
///
/// `impact_percent` is expressed as a percentage (10 means 10%).
pub fn conditional_prices(
    spot_price: f64,
    event_probability: f64,
    impact_percent: f64,
) -> Result<(f64, f64)> {
    validate_inputs(spot_price, event_probability, impact_percent)?;

    let impact = impact_percent / 100.0;
    let yes = spot_price * (1.0 + impact * (1.0 - event_probability));
    let no = spot_price * (1.0 - impact * event_probability);

    if no <= 0.0 {
        return Err(ProvisionError::PriceComputationError(format!(
            "noPrice {no} is not positive (impact {impact_percent}% too large for p={event_probability})"
        )));
    }
    Ok((yes, no))
}

fn validate_inputs(spot_price: f64, event_probability: f64, impact_percent: f64) -> Result<()> {
    if !spot_price.is_finite() || spot_price <= 0.0 {
        return Err(ProvisionError::PriceComputationError(format!(
            "spotPrice must be > 0, got {spot_price}"
        )));
    }
    if !event_probability.is_finite() || event_probability <= 0.0 || event_probability >= 1.0 {
        return Err(ProvisionError::PriceComputationError(format!(
            "eventProbability must be in (0, 1), got {event_probability}"
        )));
    }
    if !impact_percent.is_finite() || impact_percent < 0.0 {
        return Err(ProvisionError::PriceComputationError(format!(
            "impact must be >= 0, got {impact_percent}"
        )));
    }
    Ok(())
}

/// Compute the six pool targets for a proposal input. Fails before any
/// transaction when the economic inputs are malformed.
pub fn pool_targets(input: &ProposalInput) -> Result<Vec<PoolTarget>> {
    let (yes_price, no_price) =
        conditional_prices(input.spot_price, input.event_probability, input.impact)?;
    let spot = input.spot_price;
    let p = input.event_probability;

    let company = &input.company_token.symbol;
    let currency = &input.currency_token.symbol;

    let definitions: [(Leg, Leg, f64, String); 6] = [
        (
            Leg::YesCompany,
            Leg::YesCurrency,
            yes_price,
            format!("YES_{company}/YES_{currency}"),
        ),
        (
            Leg::NoCompany,
            Leg::NoCurrency,
            no_price,
            format!("NO_{company}/NO_{currency}"),
        ),
        (
            Leg::YesCompany,
            Leg::Currency,
            spot * p,
            format!("YES_{company}/{currency}"),
        ),
        (
            Leg::NoCompany,
            Leg::Currency,
            spot * (1.0 - p),
            format!("NO_{company}/{currency}"),
        ),
        (
            Leg::YesCurrency,
            Leg::Currency,
            p,
            format!("YES_{currency}/{currency}"),
        ),
        (
            Leg::NoCurrency,
            Leg::Currency,
            1.0 - p,
            format!("NO_{currency}/{currency}"),
        ),
    ];

    let default_amount: Decimal = DEFAULT_LIQUIDITY.parse().expect("valid default literal");

    let targets = definitions
        .into_iter()
        .enumerate()
        .map(|(i, (leg0, leg1, price, name))| {
            let amount1 = input
                .liquidity_amounts
                .get(i)
                .copied()
                .filter(|a| *a > Decimal::ZERO)
                .unwrap_or(default_amount);
            PoolTarget {
                pool_id: (i + 1) as u8,
                name,
                leg0,
                leg1,
                target_price: price,
                amount1,
            }
        })
        .collect();

    Ok(targets)
}

/// Materialize a pool target into exact on-chain amounts for two resolved
/// tokens: amount1 is the supplied liquidity, amount0 = amount1 / price,
/// both rendered to base units at each token's decimals.
///
/// When a computed amount rounds to zero base units but the decimal input
/// was positive, the smallest representable unit is substituted and the
/// paired amount recomputed so the implied price stays approximately on
/// target.
pub fn materialize(target: &PoolTarget, token0: Token, token1: Token) -> Result<PoolConfig> {
    let price = decimal_price(target.target_price)?;

    let amount1 = target.amount1;
    let amount0 = amount1.checked_div(price).ok_or_else(|| {
        ProvisionError::PriceComputationError(format!(
            "amount0 overflow for pool {} (amount1={amount1}, price={price})",
            target.pool_id
        ))
    })?;

    let raw0 = to_base_units(amount0, token0.decimals)?;
    let raw1 = to_base_units(amount1, token1.decimals)?;
    let mut amount0_wei = at_least_one(raw0, amount0);
    let mut amount1_wei = at_least_one(raw1, amount1);

    // A bumped leg invalidates the pair ratio: recompute the other leg from
    // the smallest unit at the target price, floor of one unit either way.
    if raw0.is_zero() && !amount0_wei.is_zero() {
        let unit0 = from_base_units(amount0_wei, token0.decimals)?;
        let paired = unit0 * price;
        amount1_wei = at_least_one(to_base_units(paired, token1.decimals)?, paired);
    } else if raw1.is_zero() && !amount1_wei.is_zero() {
        let unit1 = from_base_units(amount1_wei, token1.decimals)?;
        let paired = unit1.checked_div(price).unwrap_or(Decimal::ZERO);
        amount0_wei = at_least_one(to_base_units(paired, token0.decimals)?, paired);
    }

    // Bootstrap liquidity needs both legs non-zero
    if amount0_wei.is_zero() {
        amount0_wei = U256::from(1);
    }
    if amount1_wei.is_zero() {
        amount1_wei = U256::from(1);
    }

    Ok(PoolConfig {
        pool_id: target.pool_id,
        name: target.name.clone(),
        token0,
        token1,
        target_price: target.target_price,
        liquidity_amount1: amount1,
        amount0_wei,
        amount1_wei,
        existing_pool_address: None,
        current_pool_price: None,
    })
}

/// Convert an f64 price into a positive `Decimal` for amount math.
pub fn decimal_price(price: f64) -> Result<Decimal> {
    let d = Decimal::from_f64(price).ok_or_else(|| {
        ProvisionError::PriceComputationError(format!("price {price} not representable"))
    })?;
    if d <= Decimal::ZERO {
        return Err(ProvisionError::PriceComputationError(format!(
            "price must be > 0, got {price}"
        )));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenInput;
    use alloy::primitives::{Address, U256};
    use rust_decimal_macros::dec;

    fn input(spot: f64, p: f64, impact: f64) -> ProposalInput {
        ProposalInput {
            proposal_address: "0x0000000000000000000000000000000000000001".into(),
            market_name: "test".into(),
            company_token: TokenInput {
                address: "0x0000000000000000000000000000000000000002".into(),
                symbol: "ACME".into(),
            },
            currency_token: TokenInput {
                address: "0x0000000000000000000000000000000000000003".into(),
                symbol: "WXDAI".into(),
            },
            spot_price: spot,
            event_probability: p,
            impact,
            liquidity_amounts: vec![],
            fee_tier: None,
            adapter_address: None,
            force_add_liquidity: vec![],
            mode: Default::default(),
        }
    }

    fn token(decimals: u8) -> Token {
        Token {
            address: Address::ZERO,
            symbol: "T".into(),
            decimals,
            cached_balance: U256::ZERO,
        }
    }

    #[test]
    fn test_conditional_prices_scenario() {
        // spot=0.02173, p=0.5, impact=10%
        let (yes, no) = conditional_prices(0.02173, 0.5, 10.0).unwrap();
        assert!((yes - 0.02173 * 1.05).abs() < 1e-9);
        assert!((no - 0.0206435).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_average_invariant() {
        for &spot in &[0.02173, 1.0, 250.0] {
            for &p in &[0.1, 0.35, 0.5, 0.9] {
                for &impact in &[0.0, 5.0, 10.0, 25.0] {
                    let (yes, no) = conditional_prices(spot, p, impact).unwrap();
                    let avg = p * yes + (1.0 - p) * no;
                    assert!(
                        (avg - spot).abs() < 1e-9 * spot,
                        "invariant broken: spot={spot} p={p} impact={impact}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_input_validation() {
        assert!(conditional_prices(0.0, 0.5, 10.0).is_err());
        assert!(conditional_prices(-1.0, 0.5, 10.0).is_err());
        assert!(conditional_prices(1.0, 0.0, 10.0).is_err());
        assert!(conditional_prices(1.0, 1.0, 10.0).is_err());
        assert!(conditional_prices(1.0, 0.5, -5.0).is_err());
        // impact so large the NO price collapses
        assert!(conditional_prices(1.0, 0.9, 200.0).is_err());
    }

    #[test]
    fn test_pool_targets_structure() {
        let targets = pool_targets(&input(0.02, 0.6, 10.0)).unwrap();
        assert_eq!(targets.len(), 6);
        assert_eq!(targets[0].pool_id, 1);
        assert_eq!(targets[2].leg0, Leg::YesCompany);
        assert_eq!(targets[2].leg1, Leg::Currency);
        assert!((targets[2].target_price - 0.02 * 0.6).abs() < 1e-12);
        assert!((targets[3].target_price - 0.02 * 0.4).abs() < 1e-12);
        assert!((targets[4].target_price - 0.6).abs() < 1e-12);
        assert!((targets[5].target_price - 0.4).abs() < 1e-12);
        // defaults applied when no liquidity amounts supplied
        assert_eq!(targets[0].amount1, dec!(0.001));
    }

    #[test]
    fn test_pool_targets_uses_supplied_amounts() {
        let mut inp = input(0.02, 0.5, 10.0);
        inp.liquidity_amounts = vec![dec!(10), dec!(10), dec!(5), dec!(5), dec!(1), dec!(1)];
        let targets = pool_targets(&inp).unwrap();
        assert_eq!(targets[0].amount1, dec!(10));
        assert_eq!(targets[5].amount1, dec!(1));
    }

    #[test]
    fn test_materialize_amounts() {
        let target = PoolTarget {
            pool_id: 5,
            name: "YES_WXDAI/WXDAI".into(),
            leg0: Leg::YesCurrency,
            leg1: Leg::Currency,
            target_price: 0.5,
            amount1: dec!(1),
        };
        let cfg = materialize(&target, token(18), token(18)).unwrap();
        // amount0 = 1 / 0.5 = 2
        assert_eq!(cfg.amount0_wei, U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(cfg.amount1_wei, U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_materialize_sub_unit_liquidity_never_vanishes() {
        let target = PoolTarget {
            pool_id: 1,
            name: "tiny".into(),
            leg0: Leg::YesCompany,
            leg1: Leg::YesCurrency,
            target_price: 2.0,
            amount1: dec!(0.0000001),
        };
        // token1 has 2 decimals: 0.0000001 floors to zero units
        let cfg = materialize(&target, token(18), token(2)).unwrap();
        assert!(cfg.amount0_wei >= U256::from(1));
        assert!(cfg.amount1_wei >= U256::from(1));
    }

    #[test]
    fn test_materialize_rejects_zero_price() {
        let target = PoolTarget {
            pool_id: 1,
            name: "bad".into(),
            leg0: Leg::YesCompany,
            leg1: Leg::Currency,
            target_price: 0.0,
            amount1: dec!(1),
        };
        assert!(materialize(&target, token(18), token(18)).is_err());
    }
}
