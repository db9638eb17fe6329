//! Core data structures for the liquidity provisioning engine.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ERC20 token metadata plus the last balance observed for the wallet.
/// Metadata is loaded once per address and cached for the session; the
/// balance is refreshed on demand, never assumed fresh across operations.
#[derive(Debug, Clone)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub cached_balance: U256,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// Which AMM the pool lifecycle manager drives. Injected at construction
/// time; never selected through global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmmVariant {
    /// Uniswap V3 style: pools keyed by (token0, token1, fee), centered
    /// tick ranges around the current price.
    FeeTiered { fee: u32 },
    /// Algebra style: one pool per pair, dynamic fee, full-range positions.
    SingleTier,
}

impl AmmVariant {
    pub fn fee_tier(&self) -> Option<u32> {
        match self {
            AmmVariant::FeeTiered { fee } => Some(*fee),
            AmmVariant::SingleTier => None,
        }
    }
}

impl fmt::Display for AmmVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AmmVariant::FeeTiered { fee } => write!(f, "fee-tiered ({}bps/100)", fee),
            AmmVariant::SingleTier => write!(f, "single-tier"),
        }
    }
}

/// Target configuration for one of the six conditional-market pools.
/// Created fresh per provisioning run by the price model; the orchestrator
/// mutates amounts when an existing pool's live price differs from target.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// 1..6
    pub pool_id: u8,
    pub name: String,
    pub token0: Token,
    pub token1: Token,
    /// token1 per token0, logical order
    pub target_price: f64,
    /// Decimal units of token1 supplied as liquidity
    pub liquidity_amount1: Decimal,
    pub amount0_wei: U256,
    pub amount1_wei: U256,
    pub existing_pool_address: Option<Address>,
    pub current_pool_price: Option<f64>,
}

/// Skip/confirm decision mode. Only `Automatic` is implemented by the
/// engine itself; manual and semi-automatic confirmation flows belong to an
/// external CLI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Manual,
    #[default]
    Automatic,
    SemiAutomatic,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Mode::Manual),
            "automatic" => Ok(Mode::Automatic),
            "semi-automatic" | "semiautomatic" => Ok(Mode::SemiAutomatic),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// One leg of a pool pair as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    pub address: String,
    pub symbol: String,
}

/// Everything the engine consumes for one provisioning run. Supplied by the
/// external CLI/config collaborator as JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInput {
    pub proposal_address: String,
    pub market_name: String,
    pub company_token: TokenInput,
    pub currency_token: TokenInput,
    /// Currency per company token, decimal, > 0
    pub spot_price: f64,
    /// 0 < p < 1
    pub event_probability: f64,
    /// Expected price impact in percent (10 means 10%)
    pub impact: f64,
    /// Six decimal liquidity figures (token1 units per pool); missing
    /// entries default to a minimal non-zero amount
    #[serde(default)]
    pub liquidity_amounts: Vec<Decimal>,
    /// Fee tier override for fee-tiered AMMs
    #[serde(default)]
    pub fee_tier: Option<u32>,
    /// Split/merge adapter override
    #[serde(default)]
    pub adapter_address: Option<String>,
    /// Pool numbers (1..6) that get liquidity even when the pool exists
    #[serde(default)]
    pub force_add_liquidity: Vec<u8>,
    #[serde(default)]
    pub mode: Mode,
}

/// A futarchy proposal's token set. Immutable once loaded or discovered.
/// Conditional slots stay `None` when neither the proposal accessor nor the
/// probe-split discovery could resolve them; pools referencing such a slot
/// fail explicitly downstream.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub address: Address,
    pub company: Token,
    pub currency: Token,
    pub yes_company: Option<Token>,
    pub no_company: Option<Token>,
    pub yes_currency: Option<Token>,
    pub no_currency: Option<Token>,
    /// Unix seconds; 0 when the accessor was unreadable
    pub opening_time: u64,
}

/// Terminal status of one pool within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Success,
    Skipped,
    Failed,
}

/// Per-pool result record emitted to the external transaction-logging
/// collaborator. The engine itself persists nothing.
#[derive(Debug, Clone, Serialize)]
pub struct PoolOutcome {
    pub pool_number: u8,
    pub name: String,
    pub status: PoolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<Address>,
    /// NFT position id parsed from the mint receipt, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<U256>,
    /// Percentage deviation of the post-mint pool price from target.
    /// Reported, not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PoolOutcome {
    pub fn skipped(pool_number: u8, name: &str, pool_address: Address) -> Self {
        Self {
            pool_number,
            name: name.to_string(),
            status: PoolStatus::Skipped,
            pool_address: Some(pool_address),
            position_id: None,
            deviation_percent: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(pool_number: u8, name: &str, error: String) -> Self {
        Self {
            pool_number,
            name: name.to_string(),
            status: PoolStatus::Failed,
            pool_address: None,
            position_id: None,
            deviation_percent: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("automatic".parse::<Mode>().unwrap(), Mode::Automatic);
        assert_eq!("semi-automatic".parse::<Mode>().unwrap(), Mode::SemiAutomatic);
        assert_eq!("MANUAL".parse::<Mode>().unwrap(), Mode::Manual);
        assert!("hands-free".parse::<Mode>().is_err());
    }

    #[test]
    fn test_proposal_input_json() {
        let json = r#"{
            "proposalAddress": "0x0000000000000000000000000000000000000001",
            "marketName": "ACME buyback",
            "companyToken": {"address": "0x0000000000000000000000000000000000000002", "symbol": "ACME"},
            "currencyToken": {"address": "0x0000000000000000000000000000000000000003", "symbol": "WXDAI"},
            "spotPrice": 0.02173,
            "eventProbability": 0.5,
            "impact": 10,
            "liquidityAmounts": ["10", "10", "5", "5", "1", "1"],
            "forceAddLiquidity": [3]
        }"#;
        let input: ProposalInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.market_name, "ACME buyback");
        assert_eq!(input.liquidity_amounts.len(), 6);
        assert_eq!(input.force_add_liquidity, vec![3]);
        assert_eq!(input.mode, Mode::Automatic);
        assert!(input.fee_tier.is_none());
    }

    #[test]
    fn test_amm_variant_fee_tier() {
        assert_eq!(AmmVariant::FeeTiered { fee: 3000 }.fee_tier(), Some(3000));
        assert_eq!(AmmVariant::SingleTier.fee_tier(), None);
    }
}
