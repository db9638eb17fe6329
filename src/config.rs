//! Configuration management
//!
//! Chain and contract settings loaded from the environment (.env file
//! supported). Everything the engine needs beyond the per-run proposal
//! JSON lives here: RPC endpoint, signer key, AMM variant and its
//! factory/position-manager addresses, the split/merge adapter, and gas
//! shaping knobs.
//!
//! Author: AI-Generated
//! Created: 2026-08-10
//! Modified: 2026-08-13 — gas policy knobs

use crate::gas::{GasPolicy, GWEI};
use crate::types::AmmVariant;
use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use std::str::FromStr;

/// Fee tier used when neither the environment nor the proposal input
/// overrides it (1% — conditional token pools are thin by nature).
pub const DEFAULT_FEE_TIER: u32 = 10_000;

const DEFAULT_TICK_RANGE_STEPS: i32 = 10;

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub chain_name: String,
    pub private_key: String,

    pub amm_variant: AmmVariant,
    /// Optional: without it, existence checks degrade and creation relies on
    /// the position manager alone
    pub factory: Option<Address>,
    pub position_manager: Address,
    /// Split/merge adapter (futarchy router)
    pub adapter: Address,

    pub gas: GasPolicy,
    pub tick_range_steps: i32,
}

/// Load from the default `.env` (plus the ambient environment).
pub fn load_config() -> Result<ChainConfig> {
    dotenv::dotenv().ok();
    read_config()
}

/// Load from a chain-specific env file (e.g. `.env.gnosis`), falling back
/// to the default `.env` when it does not exist.
pub fn load_config_from_file(env_file: &str) -> Result<ChainConfig> {
    if dotenv::from_filename(env_file).is_err() {
        dotenv::dotenv().ok();
    }
    read_config()
}

fn read_config() -> Result<ChainConfig> {
    let amm_variant = match env_or("AMM_VARIANT", "fee-tiered").to_lowercase().as_str() {
        "fee-tiered" | "uniswap" => AmmVariant::FeeTiered {
            fee: env_parsed("FEE_TIER", DEFAULT_FEE_TIER)?,
        },
        "single-tier" | "algebra" => AmmVariant::SingleTier,
        other => bail!("AMM_VARIANT must be fee-tiered or single-tier, got {other}"),
    };

    let factory = match std::env::var("FACTORY_ADDRESS") {
        Ok(s) if !s.trim().is_empty() => {
            Some(Address::from_str(s.trim()).context("invalid FACTORY_ADDRESS")?)
        }
        _ => None,
    };

    let mut gas = GasPolicy::default();
    if let Ok(min_gwei) = std::env::var("MIN_PRIORITY_FEE_GWEI") {
        let min_gwei: u128 = min_gwei.parse().context("invalid MIN_PRIORITY_FEE_GWEI")?;
        gas.min_priority_fee_per_gas = min_gwei * GWEI;
    }
    if let Ok(mult) = std::env::var("GAS_FEE_MULTIPLIER") {
        gas.fee_multiplier = mult.parse().context("invalid GAS_FEE_MULTIPLIER")?;
    }

    Ok(ChainConfig {
        rpc_url: std::env::var("RPC_URL").context("RPC_URL not set")?,
        chain_id: std::env::var("CHAIN_ID")
            .context("CHAIN_ID not set")?
            .parse()
            .context("invalid CHAIN_ID")?,
        chain_name: env_or("CHAIN_NAME", "gnosis"),
        private_key: std::env::var("PRIVATE_KEY").context("PRIVATE_KEY not set")?,

        amm_variant,
        factory,
        position_manager: Address::from_str(
            &std::env::var("POSITION_MANAGER_ADDRESS")
                .context("POSITION_MANAGER_ADDRESS not set")?,
        )
        .context("invalid POSITION_MANAGER_ADDRESS")?,
        adapter: Address::from_str(
            &std::env::var("ADAPTER_ADDRESS").context("ADAPTER_ADDRESS not set")?,
        )
        .context("invalid ADAPTER_ADDRESS")?,

        gas,
        tick_range_steps: env_parsed("TICK_RANGE_STEPS", DEFAULT_TICK_RANGE_STEPS)?,
    })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(s) => s.parse().with_context(|| format!("invalid {key}")),
        Err(_) => Ok(default),
    }
}
