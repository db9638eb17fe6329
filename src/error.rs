//! Provisioning Error Taxonomy
//!
//! Typed failures for the liquidity provisioning engine. Per-pool failures
//! are caught by the orchestrator and recorded as a failed result so the
//! remaining pools still run; input-level failures (price math, malformed
//! addresses) abort the run before any transaction is submitted.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

use alloy::primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Collateral balance cannot cover a required split. Fatal for the pool;
    /// the orchestrator continues with the remaining pools.
    #[error("insufficient collateral {token}: required {required}, available {available}")]
    InsufficientCollateral {
        token: String,
        required: U256,
        available: U256,
    },

    /// A non-conditional leg lacks funds. Fatal for the pool.
    #[error("insufficient {token} balance: required {required}, available {available}")]
    InsufficientBaseTokenBalance {
        token: String,
        required: U256,
        available: U256,
    },

    /// Pool creation succeeded but no resolution strategy produced the pool
    /// address. Liquidity cannot be minted without it; manual recovery needed.
    #[error("pool address unresolved for pair {token0}/{token1} after all strategies")]
    PoolAddressUnresolved { token0: Address, token1: Address },

    /// Zero or negative divisor in price/ratio math. Indicates malformed
    /// input; aborts the whole run.
    #[error("price computation error: {0}")]
    PriceComputationError(String),

    /// On-chain revert from the split/merge adapter.
    #[error("adapter call reverted: {0}")]
    AdapterCallReverted(String),

    /// On-chain revert from an AMM contract (create/initialize/mint).
    #[error("AMM call reverted: {0}")]
    AMMCallReverted(String),

    /// Discovery fallback could not classify a conditional token slot; pools
    /// referencing it fail here instead of using an undefined address.
    #[error("conditional token unresolved: {0}")]
    ConditionalTokenUnresolved(String),

    /// ERC20 approve for the adapter or position manager failed.
    #[error("token approval failed: {0}")]
    ApprovalFailed(String),

    /// RPC transport or provider failure outside a contract revert.
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ProvisionError {
    /// True for failures that invalidate the whole run rather than one pool.
    pub fn aborts_run(&self) -> bool {
        matches!(self, ProvisionError::PriceComputationError(_))
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Shorthand for wrapping a transport/contract error from alloy.
pub fn rpc_err(context: &str, err: impl std::fmt::Display) -> ProvisionError {
    ProvisionError::Rpc(format!("{context}: {err}"))
}
