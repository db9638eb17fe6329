//! Transaction Utilities
//!
//! Shared plumbing for every transaction the engine submits: EIP-1559 fee
//! estimation shaped by the gas policy, and approve-if-insufficient ERC20
//! allowance management. Both the supply manager and the pool lifecycle
//! manager route through here so fee and allowance behavior stays uniform.
//!
//! Author: AI-Generated
//! Created: 2026-08-12

use crate::contracts::IERC20;
use crate::error::{rpc_err, ProvisionError, Result};
use crate::gas::GasPolicy;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use std::sync::Arc;
use tracing::{debug, info};

/// Current network EIP-1559 estimate shaped by the gas policy.
pub async fn effective_fees<P: Provider>(
    provider: &Arc<P>,
    gas: &GasPolicy,
) -> Result<(u128, u128)> {
    let est = provider
        .estimate_eip1559_fees()
        .await
        .map_err(|e| rpc_err("estimate_eip1559_fees", e))?;
    Ok(gas.effective_fees(est.max_fee_per_gas, est.max_priority_fee_per_gas))
}

/// Approve `spender` for `token` if the current allowance is below
/// `amount`. Approves max so later operations skip the extra transaction.
pub async fn ensure_allowance<P: Provider + Clone + 'static>(
    provider: &Arc<P>,
    wallet: Address,
    gas: &GasPolicy,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<()> {
    let erc20 = IERC20::new(token, provider.clone());

    let allowance = erc20
        .allowance(wallet, spender)
        .call()
        .await
        .map_err(|e| rpc_err("allowance", e))?;
    if allowance >= amount {
        debug!("Sufficient allowance for {}: {} >= {}", token, allowance, amount);
        return Ok(());
    }

    info!("Approving {} for spender {}", token, spender);
    let (max_fee, priority_fee) = effective_fees(provider, gas).await?;
    let pending = erc20
        .approve(spender, U256::MAX)
        .max_fee_per_gas(max_fee)
        .max_priority_fee_per_gas(priority_fee)
        .send()
        .await
        .map_err(|e| ProvisionError::ApprovalFailed(format!("approve send: {e}")))?;

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| rpc_err("approve receipt", e))?;
    if !receipt.status() {
        return Err(ProvisionError::ApprovalFailed(format!(
            "approve reverted in tx {}",
            receipt.transaction_hash
        )));
    }
    debug!("Approval confirmed: {}", receipt.transaction_hash);
    Ok(())
}
