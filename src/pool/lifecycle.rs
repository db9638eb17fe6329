//! Pool Lifecycle Manager
//!
//! Drives one pool from existence check through creation, tick-range
//! selection, and liquidity minting, for either AMM variant:
//!
//! ```text
//! UNKNOWN → {EXISTS | ABSENT} → create → READY_FOR_LIQUIDITY
//!         → LIQUIDITY_MINTED
//! ```
//!
//! The AMM variant is injected at construction time (fee-tiered vs
//! single-tier); nothing here consults global state. All token pairs enter
//! in canonical AMM order — callers convert through `ordering` first.
//!
//! Pool-address resolution after creation is multi-strategy and ordered:
//! (a) Initialize event in the creation receipt, (b) bounded factory
//! polling (indexing lag), (c) factory pool-created event, (d) final
//! factory view call. Exhausting all four is a fatal
//! `PoolAddressUnresolved`.
//!
//! Author: AI-Generated
//! Created: 2026-08-12
//! Modified: 2026-08-13 — raw create + initialize fallback

use crate::contracts::{
    IAlgebraFactory, IAlgebraPool, IAlgebraPositionManager, INonfungiblePositionManager,
    IUniswapV3Factory, IUniswapV3Pool,
};
use crate::error::{rpc_err, ProvisionError, Result};
use crate::gas::GasPolicy;
use crate::ordering::CanonicalOrdering;
use crate::pool::sqrt_price::{
    centered_range, full_range, price_from_tick, tick_to_i24,
};
use crate::txn;
use crate::types::AmmVariant;
use alloy::primitives::aliases::U160;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionReceipt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Factory polling after creation: 8 attempts, 1.5 s apart (indexing lag)
const RESOLVE_ATTEMPTS: u32 = 8;
const RESOLVE_BACKOFF_MS: u64 = 1_500;

/// Mint deadline window in seconds
const MINT_DEADLINE_SECS: u64 = 600;

/// Helper: convert a u32 fee tier to the contract's uint24 argument type.
fn fee_to_u24(fee: u32) -> alloy::primitives::Uint<24, 1> {
    debug_assert!(fee <= 0xFFFFFF, "fee {} exceeds U24 max", fee);
    alloy::primitives::Uint::from_limbs([fee as u64])
}

/// Outcome of a liquidity mint.
#[derive(Debug, Clone)]
pub struct MintResult {
    pub tx_hash: TxHash,
    /// NFT position id from the mint receipt's Transfer event. Absence is
    /// non-fatal — the liquidity was still added.
    pub position_id: Option<U256>,
}

pub struct PoolLifecycleManager<P> {
    provider: Arc<P>,
    wallet: Address,
    variant: AmmVariant,
    /// Factory address; None degrades existence checks to "absent"
    factory: Option<Address>,
    position_manager: Address,
    gas: GasPolicy,
    /// Spacing multiples either side of the current tick (fee-tiered only)
    tick_range_steps: i32,
}

impl<P: Provider + Clone + 'static> PoolLifecycleManager<P> {
    pub fn new(
        provider: Arc<P>,
        wallet: Address,
        variant: AmmVariant,
        factory: Option<Address>,
        position_manager: Address,
        gas: GasPolicy,
        tick_range_steps: i32,
    ) -> Self {
        Self {
            provider,
            wallet,
            variant,
            factory,
            position_manager,
            gas,
            tick_range_steps,
        }
    }

    pub fn variant(&self) -> AmmVariant {
        self.variant
    }

    // ── Existence ────────────────────────────────────────────────────

    /// Look up the pool for a canonical pair. A missing or unreadable
    /// factory degrades to "absent" — a later creation attempt is allowed
    /// to fail naturally if the pool secretly exists.
    pub async fn find_pool(&self, ordering: &CanonicalOrdering) -> Result<Option<Address>> {
        let Some(factory) = self.factory else {
            warn!("Factory address not configured; treating pool as absent");
            return Ok(None);
        };

        let result = match self.variant {
            AmmVariant::FeeTiered { fee } => {
                IUniswapV3Factory::new(factory, self.provider.clone())
                    .getPool(ordering.amm_token0, ordering.amm_token1, fee_to_u24(fee))
                    .call()
                    .await
            }
            AmmVariant::SingleTier => {
                IAlgebraFactory::new(factory, self.provider.clone())
                    .poolByPair(ordering.amm_token0, ordering.amm_token1)
                    .call()
                    .await
            }
        };

        match result {
            Ok(addr) if addr == Address::ZERO => Ok(None),
            Ok(addr) => Ok(Some(addr)),
            Err(e) => {
                warn!("Factory existence query failed ({e}); treating pool as absent");
                Ok(None)
            }
        }
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create and initialize the pool at the given sqrt price, returning
    /// its resolved address. Tries the position manager's combined
    /// create-and-initialize first; some factory/position-manager
    /// combinations reject it, so a raw factory create followed by an
    /// explicit initialize is the fallback.
    pub async fn create_pool(
        &self,
        ordering: &CanonicalOrdering,
        sqrt_price_x96: U160,
    ) -> Result<Address> {
        info!(
            "🏗️ Creating pool {} / {} at sqrtPriceX96 {}",
            ordering.amm_token0, ordering.amm_token1, sqrt_price_x96
        );

        match self.create_combined(ordering, sqrt_price_x96).await {
            Ok(receipt) => self.resolve_pool_address(&receipt, ordering).await,
            Err(e) => {
                warn!("Combined create-and-initialize failed ({e}); falling back to raw create");
                let receipt = self.create_raw(ordering).await?;
                let pool = self.resolve_pool_address(&receipt, ordering).await?;
                self.initialize_pool(pool, sqrt_price_x96).await?;
                Ok(pool)
            }
        }
    }

    async fn create_combined(
        &self,
        ordering: &CanonicalOrdering,
        sqrt_price_x96: U160,
    ) -> Result<TransactionReceipt> {
        let (max_fee, priority_fee) = txn::effective_fees(&self.provider, &self.gas).await?;

        let pending = match self.variant {
            AmmVariant::FeeTiered { fee } => {
                INonfungiblePositionManager::new(self.position_manager, self.provider.clone())
                    .createAndInitializePoolIfNecessary(
                        ordering.amm_token0,
                        ordering.amm_token1,
                        fee_to_u24(fee),
                        sqrt_price_x96,
                    )
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee)
                    .send()
                    .await
            }
            AmmVariant::SingleTier => {
                IAlgebraPositionManager::new(self.position_manager, self.provider.clone())
                    .createAndInitializePoolIfNecessary(
                        ordering.amm_token0,
                        ordering.amm_token1,
                        sqrt_price_x96,
                    )
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee)
                    .send()
                    .await
            }
        }
        .map_err(|e| ProvisionError::AMMCallReverted(format!("createAndInitializePoolIfNecessary: {e}")))?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| rpc_err("create receipt", e))?;
        if !receipt.status() {
            return Err(ProvisionError::AMMCallReverted(format!(
                "createAndInitializePoolIfNecessary reverted in tx {}",
                receipt.transaction_hash
            )));
        }
        Ok(receipt)
    }

    async fn create_raw(&self, ordering: &CanonicalOrdering) -> Result<TransactionReceipt> {
        let factory = self.factory.ok_or_else(|| {
            ProvisionError::AMMCallReverted(
                "raw pool creation needs a factory address and none is configured".into(),
            )
        })?;
        let (max_fee, priority_fee) = txn::effective_fees(&self.provider, &self.gas).await?;

        let pending = match self.variant {
            AmmVariant::FeeTiered { fee } => {
                IUniswapV3Factory::new(factory, self.provider.clone())
                    .createPool(ordering.amm_token0, ordering.amm_token1, fee_to_u24(fee))
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee)
                    .send()
                    .await
            }
            AmmVariant::SingleTier => {
                IAlgebraFactory::new(factory, self.provider.clone())
                    .createPool(ordering.amm_token0, ordering.amm_token1)
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee)
                    .send()
                    .await
            }
        }
        .map_err(|e| ProvisionError::AMMCallReverted(format!("factory createPool: {e}")))?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| rpc_err("createPool receipt", e))?;
        if !receipt.status() {
            return Err(ProvisionError::AMMCallReverted(format!(
                "factory createPool reverted in tx {}",
                receipt.transaction_hash
            )));
        }
        Ok(receipt)
    }

    async fn initialize_pool(&self, pool: Address, sqrt_price_x96: U160) -> Result<()> {
        let (max_fee, priority_fee) = txn::effective_fees(&self.provider, &self.gas).await?;

        let pending = match self.variant {
            AmmVariant::FeeTiered { .. } => {
                IUniswapV3Pool::new(pool, self.provider.clone())
                    .initialize(sqrt_price_x96)
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee)
                    .send()
                    .await
            }
            AmmVariant::SingleTier => {
                IAlgebraPool::new(pool, self.provider.clone())
                    .initialize(sqrt_price_x96)
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee)
                    .send()
                    .await
            }
        }
        .map_err(|e| ProvisionError::AMMCallReverted(format!("pool initialize: {e}")))?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| rpc_err("initialize receipt", e))?;
        if !receipt.status() {
            return Err(ProvisionError::AMMCallReverted(format!(
                "pool initialize reverted in tx {}",
                receipt.transaction_hash
            )));
        }
        info!("Pool {} initialized", pool);
        Ok(())
    }

    // ── Address resolution ───────────────────────────────────────────

    /// Ordered multi-strategy resolution of the pool address after a
    /// creation transaction.
    async fn resolve_pool_address(
        &self,
        receipt: &TransactionReceipt,
        ordering: &CanonicalOrdering,
    ) -> Result<Address> {
        // (a) Initialize event emitted by the pool itself
        if let Some(addr) = self.pool_address_from_initialize_event(receipt) {
            debug!("Pool address from Initialize event: {}", addr);
            return Ok(addr);
        }

        // (b) Bounded factory polling — factories can lag the receipt
        for attempt in 1..=RESOLVE_ATTEMPTS {
            if let Some(addr) = self.find_pool(ordering).await? {
                debug!("Pool address from factory poll (attempt {}): {}", attempt, addr);
                return Ok(addr);
            }
            sleep(Duration::from_millis(RESOLVE_BACKOFF_MS)).await;
        }

        // (c) Factory pool-created event in the same receipt
        if let Some(addr) = self.pool_address_from_factory_event(receipt) {
            debug!("Pool address from factory event: {}", addr);
            return Ok(addr);
        }

        // (d) Final factory view call
        if let Some(addr) = self.find_pool(ordering).await? {
            return Ok(addr);
        }

        Err(ProvisionError::PoolAddressUnresolved {
            token0: ordering.amm_token0,
            token1: ordering.amm_token1,
        })
    }

    fn pool_address_from_initialize_event(&self, receipt: &TransactionReceipt) -> Option<Address> {
        for log in receipt.inner.logs() {
            let emitter = match self.variant {
                AmmVariant::FeeTiered { .. } => log
                    .log_decode::<IUniswapV3Pool::Initialize>()
                    .ok()
                    .map(|d| d.inner.address),
                AmmVariant::SingleTier => log
                    .log_decode::<IAlgebraPool::Initialize>()
                    .ok()
                    .map(|d| d.inner.address),
            };
            if let Some(addr) = emitter {
                return Some(addr);
            }
        }
        None
    }

    fn pool_address_from_factory_event(&self, receipt: &TransactionReceipt) -> Option<Address> {
        for log in receipt.inner.logs() {
            let pool = match self.variant {
                AmmVariant::FeeTiered { .. } => log
                    .log_decode::<IUniswapV3Factory::PoolCreated>()
                    .ok()
                    .map(|d| d.inner.data.pool),
                AmmVariant::SingleTier => log
                    .log_decode::<IAlgebraFactory::Pool>()
                    .ok()
                    .map(|d| d.inner.data.pool),
            };
            if let Some(addr) = pool {
                return Some(addr);
            }
        }
        None
    }

    // ── Pool state ───────────────────────────────────────────────────

    async fn pool_tick(&self, pool: Address) -> Result<i32> {
        match self.variant {
            AmmVariant::FeeTiered { .. } => {
                let slot0 = IUniswapV3Pool::new(pool, self.provider.clone())
                    .slot0()
                    .call()
                    .await
                    .map_err(|e| rpc_err("slot0", e))?;
                Ok(i32::try_from(slot0.tick).unwrap_or(0))
            }
            AmmVariant::SingleTier => {
                let gs = IAlgebraPool::new(pool, self.provider.clone())
                    .globalState()
                    .call()
                    .await
                    .map_err(|e| rpc_err("globalState", e))?;
                Ok(i32::try_from(gs.tick).unwrap_or(0))
            }
        }
    }

    async fn pool_tick_spacing(&self, pool: Address) -> Result<i32> {
        let spacing = match self.variant {
            AmmVariant::FeeTiered { .. } => {
                IUniswapV3Pool::new(pool, self.provider.clone())
                    .tickSpacing()
                    .call()
                    .await
                    .map_err(|e| rpc_err("tickSpacing", e))?
            }
            AmmVariant::SingleTier => {
                IAlgebraPool::new(pool, self.provider.clone())
                    .tickSpacing()
                    .call()
                    .await
                    .map_err(|e| rpc_err("tickSpacing", e))?
            }
        };
        let spacing = i32::try_from(spacing).unwrap_or(1);
        Ok(spacing.max(1))
    }

    /// Live pool price converted to the caller's logical order, using the
    /// logical decimal counts.
    pub async fn logical_pool_price(
        &self,
        pool: Address,
        ordering: &CanonicalOrdering,
        logical_decimals0: u8,
        logical_decimals1: u8,
    ) -> Result<f64> {
        let (amm_d0, amm_d1) = ordering.to_amm_decimals(logical_decimals0, logical_decimals1);
        let tick = self.pool_tick(pool).await?;
        let amm_price = price_from_tick(tick, amm_d0, amm_d1);
        Ok(ordering.to_logical_price(amm_price))
    }

    /// Tick range for the liquidity position: centered around the current
    /// tick for the fee-tiered variant, full-range for single-tier, both
    /// aligned to the pool's tick spacing.
    pub async fn tick_range(&self, pool: Address) -> Result<(i32, i32)> {
        let spacing = self.pool_tick_spacing(pool).await?;
        match self.variant {
            AmmVariant::FeeTiered { .. } => {
                let tick = self.pool_tick(pool).await?;
                Ok(centered_range(tick, spacing, self.tick_range_steps))
            }
            AmmVariant::SingleTier => Ok(full_range(spacing)),
        }
    }

    // ── Minting ──────────────────────────────────────────────────────

    /// Mint a liquidity position. Amounts must already be in canonical AMM
    /// order. Minimum amounts are zero: acceptable only for the small
    /// bootstrap liquidity this engine seeds.
    pub async fn mint_liquidity(
        &self,
        pool: Address,
        ordering: &CanonicalOrdering,
        amount0: U256,
        amount1: U256,
    ) -> Result<MintResult> {
        txn::ensure_allowance(
            &self.provider,
            self.wallet,
            &self.gas,
            ordering.amm_token0,
            self.position_manager,
            amount0,
        )
        .await?;
        txn::ensure_allowance(
            &self.provider,
            self.wallet,
            &self.gas,
            ordering.amm_token1,
            self.position_manager,
            amount1,
        )
        .await?;

        let (tick_lower, tick_upper) = self.tick_range(pool).await?;
        info!(
            "💰 Minting liquidity: amount0={} amount1={} ticks [{}, {}]",
            amount0, amount1, tick_lower, tick_upper
        );

        let deadline = U256::from(unix_now() + MINT_DEADLINE_SECS);
        let (max_fee, priority_fee) = txn::effective_fees(&self.provider, &self.gas).await?;

        let receipt = match self.variant {
            AmmVariant::FeeTiered { fee } => {
                let pm =
                    INonfungiblePositionManager::new(self.position_manager, self.provider.clone());
                let params = INonfungiblePositionManager::MintParams {
                    token0: ordering.amm_token0,
                    token1: ordering.amm_token1,
                    fee: fee_to_u24(fee),
                    tickLower: tick_to_i24(tick_lower),
                    tickUpper: tick_to_i24(tick_upper),
                    amount0Desired: amount0,
                    amount1Desired: amount1,
                    amount0Min: U256::ZERO,
                    amount1Min: U256::ZERO,
                    recipient: self.wallet,
                    deadline,
                };
                let call = pm
                    .mint(params)
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee);
                let estimate = call
                    .estimate_gas()
                    .await
                    .map_err(|e| ProvisionError::AMMCallReverted(format!("mint estimate: {e}")))?;
                call.gas(self.gas.buffered_gas_limit(estimate))
                    .send()
                    .await
                    .map_err(|e| ProvisionError::AMMCallReverted(format!("mint: {e}")))?
                    .get_receipt()
                    .await
                    .map_err(|e| rpc_err("mint receipt", e))?
            }
            AmmVariant::SingleTier => {
                let pm = IAlgebraPositionManager::new(self.position_manager, self.provider.clone());
                let params = IAlgebraPositionManager::MintParams {
                    token0: ordering.amm_token0,
                    token1: ordering.amm_token1,
                    tickLower: tick_to_i24(tick_lower),
                    tickUpper: tick_to_i24(tick_upper),
                    amount0Desired: amount0,
                    amount1Desired: amount1,
                    amount0Min: U256::ZERO,
                    amount1Min: U256::ZERO,
                    recipient: self.wallet,
                    deadline,
                };
                let call = pm
                    .mint(params)
                    .max_fee_per_gas(max_fee)
                    .max_priority_fee_per_gas(priority_fee);
                let estimate = call
                    .estimate_gas()
                    .await
                    .map_err(|e| ProvisionError::AMMCallReverted(format!("mint estimate: {e}")))?;
                call.gas(self.gas.buffered_gas_limit(estimate))
                    .send()
                    .await
                    .map_err(|e| ProvisionError::AMMCallReverted(format!("mint: {e}")))?
                    .get_receipt()
                    .await
                    .map_err(|e| rpc_err("mint receipt", e))?
            }
        };

        if !receipt.status() {
            return Err(ProvisionError::AMMCallReverted(format!(
                "mint reverted in tx {}",
                receipt.transaction_hash
            )));
        }

        let position_id = self.position_id_from_receipt(&receipt);
        if position_id.is_none() {
            warn!("Mint succeeded but no position id found in receipt logs");
        }

        info!("✅ Liquidity minted: {}", receipt.transaction_hash);
        Ok(MintResult {
            tx_hash: receipt.transaction_hash,
            position_id,
        })
    }

    /// NFT position id from the ERC721 Transfer to the wallet. ERC20
    /// Transfer logs in the same receipt have a different indexed-topic
    /// shape and fail to decode, so they never match.
    fn position_id_from_receipt(&self, receipt: &TransactionReceipt) -> Option<U256> {
        for log in receipt.inner.logs() {
            let decoded = match self.variant {
                AmmVariant::FeeTiered { .. } => log
                    .log_decode::<INonfungiblePositionManager::Transfer>()
                    .ok()
                    .map(|d| (d.inner.address, d.inner.data.to, d.inner.data.tokenId)),
                AmmVariant::SingleTier => log
                    .log_decode::<IAlgebraPositionManager::Transfer>()
                    .ok()
                    .map(|d| (d.inner.address, d.inner.data.to, d.inner.data.tokenId)),
            };
            if let Some((emitter, to, token_id)) = decoded {
                if emitter == self.position_manager && to == self.wallet {
                    return Some(token_id);
                }
            }
        }
        None
    }

    // ── Verification ─────────────────────────────────────────────────

    /// Percentage deviation of the live pool price from the intended
    /// logical target. Reported, not enforced.
    pub async fn verify_price(
        &self,
        pool: Address,
        ordering: &CanonicalOrdering,
        target_logical_price: f64,
        logical_decimals0: u8,
        logical_decimals1: u8,
    ) -> Result<f64> {
        let live = self
            .logical_pool_price(pool, ordering, logical_decimals0, logical_decimals1)
            .await?;
        if target_logical_price == 0.0 {
            return Err(ProvisionError::PriceComputationError(
                "cannot verify against zero target price".into(),
            ));
        }
        let deviation = (live - target_logical_price) / target_logical_price * 100.0;
        info!(
            "🔎 Price check: live {:.8} vs target {:.8} ({:+.3}% deviation)",
            live, target_logical_price, deviation
        );
        Ok(deviation)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_to_u24() {
        assert_eq!(fee_to_u24(3000).to::<u32>(), 3000);
        assert_eq!(fee_to_u24(100).to::<u32>(), 100);
    }
}
