//! Liquidity Provisioning Orchestrator
//!
//! Drives one provisioning run end to end: computes the six pool targets,
//! resolves each target's legs against the proposal's token set, tops up
//! conditional balances by splitting collateral, creates and initializes
//! missing pools, mints liquidity, and verifies the resulting price.
//!
//! Pools are processed strictly sequentially — every transaction spends the
//! same wallet's nonces, and a pool's split can feed the next pool's legs.
//! A failed pool is recorded and the run moves on; only malformed economic
//! input (price computation) aborts the whole run, and it does so before
//! any transaction is submitted.
//!
//! Author: AI-Generated
//! Created: 2026-08-13
//! Modified: 2026-08-14 — existing-pool re-anchoring

use crate::amounts::{at_least_one, from_base_units, to_base_units};
use crate::conditional::ConditionalTokenManager;
use crate::error::{ProvisionError, Result};
use crate::ordering;
use crate::pool::sqrt_price::encode_sqrt_ratio_x96;
use crate::pool::PoolLifecycleManager;
use crate::pricing::{self, Leg, PoolTarget};
use crate::tokens::TokenRegistry;
use crate::types::{Mode, PoolConfig, PoolOutcome, PoolStatus, Proposal, ProposalInput, Token};
use alloy::primitives::U256;
use alloy::providers::Provider;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

pub struct LiquidityOrchestrator<P> {
    registry: TokenRegistry<P>,
    conditional: ConditionalTokenManager<P>,
    lifecycle: PoolLifecycleManager<P>,
    /// Log every planned transaction without sending any
    dry_run: bool,
}

impl<P: Provider + Clone + 'static> LiquidityOrchestrator<P> {
    pub fn new(
        registry: TokenRegistry<P>,
        conditional: ConditionalTokenManager<P>,
        lifecycle: PoolLifecycleManager<P>,
        dry_run: bool,
    ) -> Self {
        Self {
            registry,
            conditional,
            lifecycle,
            dry_run,
        }
    }

    /// Run the full six-pool provisioning sequence for a proposal.
    pub async fn run(
        &self,
        input: &ProposalInput,
        proposal: &Proposal,
    ) -> Result<Vec<PoolOutcome>> {
        // Validates economic input; any failure here aborts before a single
        // transaction is submitted
        let targets = pricing::pool_targets(input)?;

        if input.mode != Mode::Automatic {
            warn!(
                "Mode {:?} requested; confirmation flows are external — proceeding automatically",
                input.mode
            );
        }
        info!(
            "🚀 Provisioning {} pools for {} ({}, {})",
            targets.len(),
            input.market_name,
            proposal.address,
            self.lifecycle.variant()
        );
        if self.dry_run {
            info!("🧪 Dry-run: transactions are logged, not sent");
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in &targets {
            let outcome = match self.provision_pool(input, proposal, target).await {
                Ok(outcome) => outcome,
                Err(e) if e.aborts_run() => return Err(e),
                Err(e) => {
                    warn!("❌ Pool {} ({}) failed: {}", target.pool_id, target.name, e);
                    PoolOutcome::failed(target.pool_id, &target.name, e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        log_summary(&outcomes);
        Ok(outcomes)
    }

    async fn provision_pool(
        &self,
        input: &ProposalInput,
        proposal: &Proposal,
        target: &PoolTarget,
    ) -> Result<PoolOutcome> {
        let token0 = resolve_leg(proposal, target.leg0)?;
        let token1 = resolve_leg(proposal, target.leg1)?;
        let mut cfg = pricing::materialize(target, token0, token1)?;

        let pair = ordering::order(cfg.token0.address, cfg.token1.address);
        let existing = self.lifecycle.find_pool(&pair).await?;

        if let Some(pool) = existing {
            if !input.force_add_liquidity.contains(&cfg.pool_id) {
                info!(
                    "⏭️ Pool {} ({}) exists at {} — skipping",
                    cfg.pool_id, cfg.name, pool
                );
                return Ok(PoolOutcome::skipped(cfg.pool_id, &cfg.name, pool));
            }

            // Forced add into a live pool: the mint must match the pool's
            // current price, not ours, or the position is single-sided
            let live = self
                .lifecycle
                .logical_pool_price(pool, &pair, cfg.token0.decimals, cfg.token1.decimals)
                .await?;
            cfg.existing_pool_address = Some(pool);
            cfg.current_pool_price = Some(live);
            re_anchor_amounts(&mut cfg, live)?;
            info!(
                "♻️ Pool {} exists at {}; re-anchored amounts to live price {:.8}",
                cfg.pool_id, pool, live
            );
        }

        if self.dry_run {
            info!(
                "🧪 [dry-run] pool {} ({}): amount0={} {} amount1={} {} target price {:.8}{}",
                cfg.pool_id,
                cfg.name,
                cfg.amount0_wei,
                cfg.token0.symbol,
                cfg.amount1_wei,
                cfg.token1.symbol,
                cfg.target_price,
                match cfg.existing_pool_address {
                    Some(p) => format!(" into existing pool {p}"),
                    None => " (pool would be created)".to_string(),
                }
            );
            return Ok(PoolOutcome {
                pool_number: cfg.pool_id,
                name: cfg.name.clone(),
                status: PoolStatus::Skipped,
                pool_address: cfg.existing_pool_address,
                position_id: None,
                deviation_percent: None,
                error: None,
                timestamp: Utc::now(),
            });
        }

        let mut leg0_token = cfg.token0.clone();
        let mut leg1_token = cfg.token1.clone();
        self.ensure_leg_balance(proposal, target.leg0, &mut leg0_token, cfg.amount0_wei)
            .await?;
        self.ensure_leg_balance(proposal, target.leg1, &mut leg1_token, cfg.amount1_wei)
            .await?;

        let (amm_amount0, amm_amount1) = pair.to_amm_amounts(cfg.amount0_wei, cfg.amount1_wei);

        let pool = match cfg.existing_pool_address {
            Some(pool) => pool,
            None => {
                let sqrt_price = encode_sqrt_ratio_x96(amm_amount1, amm_amount0)?;
                self.lifecycle.create_pool(&pair, sqrt_price).await?
            }
        };

        let mint = self
            .lifecycle
            .mint_liquidity(pool, &pair, amm_amount0, amm_amount1)
            .await?;

        let deviation = match self
            .lifecycle
            .verify_price(
                pool,
                &pair,
                cfg.current_pool_price.unwrap_or(cfg.target_price),
                cfg.token0.decimals,
                cfg.token1.decimals,
            )
            .await
        {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("Price verification failed for pool {}: {e}", cfg.pool_id);
                None
            }
        };

        info!("✅ Pool {} ({}) provisioned at {}", cfg.pool_id, cfg.name, pool);
        Ok(PoolOutcome {
            pool_number: cfg.pool_id,
            name: cfg.name.clone(),
            status: PoolStatus::Success,
            pool_address: Some(pool),
            position_id: mint.position_id,
            deviation_percent: deviation,
            error: None,
            timestamp: Utc::now(),
        })
    }

    /// Make one leg's balance cover the required amount: conditional legs
    /// split collateral through the adapter, collateral legs are check-only.
    async fn ensure_leg_balance(
        &self,
        proposal: &Proposal,
        leg: Leg,
        token: &mut Token,
        required: U256,
    ) -> Result<()> {
        match leg {
            Leg::Company | Leg::Currency => {
                let balance = self.registry.refresh_balance(token).await?;
                if balance < required {
                    return Err(ProvisionError::InsufficientBaseTokenBalance {
                        token: token.symbol.clone(),
                        required,
                        available: balance,
                    });
                }
                Ok(())
            }
            Leg::YesCompany | Leg::NoCompany => {
                let mut collateral = proposal.company.clone();
                let is_yes = leg == Leg::YesCompany;
                self.conditional
                    .ensure_conditional_tokens(
                        &self.registry,
                        proposal.address,
                        &mut collateral,
                        token,
                        required,
                        is_yes,
                    )
                    .await?;
                Ok(())
            }
            Leg::YesCurrency | Leg::NoCurrency => {
                let mut collateral = proposal.currency.clone();
                let is_yes = leg == Leg::YesCurrency;
                self.conditional
                    .ensure_conditional_tokens(
                        &self.registry,
                        proposal.address,
                        &mut collateral,
                        token,
                        required,
                        is_yes,
                    )
                    .await?;
                Ok(())
            }
        }
    }
}

/// Pick the token for a leg from the proposal's resolved set. Unresolved
/// conditional slots fail the referencing pool here, with the slot named.
fn resolve_leg(proposal: &Proposal, leg: Leg) -> Result<Token> {
    let (slot, name) = match leg {
        Leg::Company => return Ok(proposal.company.clone()),
        Leg::Currency => return Ok(proposal.currency.clone()),
        Leg::YesCompany => (&proposal.yes_company, "YES company"),
        Leg::NoCompany => (&proposal.no_company, "NO company"),
        Leg::YesCurrency => (&proposal.yes_currency, "YES currency"),
        Leg::NoCurrency => (&proposal.no_currency, "NO currency"),
    };
    slot.clone()
        .ok_or_else(|| ProvisionError::ConditionalTokenUnresolved(name.to_string()))
}

/// Recompute a pool config's amounts against a live pool price, keeping the
/// leg carrying more value and rescaling the other so the implied ratio
/// matches the pool. The supplied liquidity budget is a ceiling, not a
/// precise spend.
fn re_anchor_amounts(cfg: &mut PoolConfig, live_price: f64) -> Result<()> {
    let price = pricing::decimal_price(live_price)?;

    let amount0 = from_base_units(cfg.amount0_wei, cfg.token0.decimals)?;
    let amount1 = from_base_units(cfg.amount1_wei, cfg.token1.decimals)?;
    let value0_in_token1 = amount0 * price;

    if amount1 >= value0_in_token1 {
        // token1 leg dominates: keep it, resize token0
        let new_amount0 = amount1.checked_div(price).unwrap_or(Decimal::ZERO);
        cfg.amount0_wei = at_least_one(
            to_base_units(new_amount0, cfg.token0.decimals)?,
            new_amount0,
        );
    } else {
        let new_amount1 = value0_in_token1;
        cfg.amount1_wei = at_least_one(
            to_base_units(new_amount1, cfg.token1.decimals)?,
            new_amount1,
        );
    }

    if cfg.amount0_wei.is_zero() {
        cfg.amount0_wei = U256::from(1);
    }
    if cfg.amount1_wei.is_zero() {
        cfg.amount1_wei = U256::from(1);
    }
    Ok(())
}

fn log_summary(outcomes: &[PoolOutcome]) {
    let succeeded = outcomes.iter().filter(|o| o.status == PoolStatus::Success).count();
    let skipped = outcomes.iter().filter(|o| o.status == PoolStatus::Skipped).count();
    let failed = outcomes.iter().filter(|o| o.status == PoolStatus::Failed).count();

    info!("📊 Run complete: {} succeeded, {} skipped, {} failed", succeeded, skipped, failed);
    for outcome in outcomes {
        match outcome.status {
            PoolStatus::Success => info!(
                "   #{} {} — pool {}{}{}",
                outcome.pool_number,
                outcome.name,
                outcome.pool_address.map(|a| a.to_string()).unwrap_or_default(),
                outcome
                    .position_id
                    .map(|id| format!(", position {id}"))
                    .unwrap_or_default(),
                outcome
                    .deviation_percent
                    .map(|d| format!(", {d:+.3}% off target"))
                    .unwrap_or_default(),
            ),
            PoolStatus::Skipped => info!("   #{} {} — skipped", outcome.pool_number, outcome.name),
            PoolStatus::Failed => warn!(
                "   #{} {} — failed: {}",
                outcome.pool_number,
                outcome.name,
                outcome.error.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use rust_decimal_macros::dec;

    fn token(decimals: u8) -> Token {
        Token {
            address: Address::ZERO,
            symbol: "T".into(),
            decimals,
            cached_balance: U256::ZERO,
        }
    }

    fn cfg(amount0: u128, amount1: u128) -> PoolConfig {
        PoolConfig {
            pool_id: 1,
            name: "test".into(),
            token0: token(18),
            token1: token(18),
            target_price: 0.5,
            liquidity_amount1: dec!(1),
            amount0_wei: U256::from(amount0),
            amount1_wei: U256::from(amount1),
            existing_pool_address: None,
            current_pool_price: None,
        }
    }

    #[test]
    fn test_resolve_leg_collateral() {
        let proposal = Proposal {
            address: Address::ZERO,
            company: token(18),
            currency: token(18),
            yes_company: None,
            no_company: None,
            yes_currency: None,
            no_currency: None,
            opening_time: 0,
        };
        assert!(resolve_leg(&proposal, Leg::Company).is_ok());
        assert!(matches!(
            resolve_leg(&proposal, Leg::YesCompany),
            Err(ProvisionError::ConditionalTokenUnresolved(_))
        ));
    }

    #[test]
    fn test_re_anchor_keeps_dominant_leg() {
        // 2 token0 + 1 token1 at target 0.5; live price moved to 1.0, so the
        // token0 leg now carries 2 in token1 terms and dominates
        let mut c = cfg(2_000_000_000_000_000_000, 1_000_000_000_000_000_000);
        re_anchor_amounts(&mut c, 1.0).unwrap();
        assert_eq!(c.amount0_wei, U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(c.amount1_wei, U256::from(2_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_re_anchor_ratio_matches_live_price() {
        let mut c = cfg(2_000_000_000_000_000_000, 1_000_000_000_000_000_000);
        re_anchor_amounts(&mut c, 0.25).unwrap();
        // amount1 dominates at the lower price: amount0 = 1 / 0.25 = 4
        assert_eq!(c.amount0_wei, U256::from(4_000_000_000_000_000_000u128));
        assert_eq!(c.amount1_wei, U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_re_anchor_rejects_zero_price() {
        let mut c = cfg(1, 1);
        assert!(re_anchor_amounts(&mut c, 0.0).is_err());
    }
}
