//! Token Metadata Registry
//!
//! Loads ERC20 metadata (symbol, decimals) once per address and caches it
//! for the process lifetime. The cache is append-only and keyed by address,
//! so concurrent readers never need a lock and no writer removes entries.
//! Balances are always read fresh — they are never cached across the
//! operations that depend on them.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::contracts::IERC20;
use crate::error::{rpc_err, Result};
use crate::types::Token;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct TokenMeta {
    symbol: String,
    decimals: u8,
}

/// Session-scoped token metadata cache bound to one wallet.
pub struct TokenRegistry<P> {
    provider: Arc<P>,
    wallet: Address,
    cache: DashMap<Address, TokenMeta>,
}

impl<P: Provider + Clone + 'static> TokenRegistry<P> {
    pub fn new(provider: Arc<P>, wallet: Address) -> Self {
        Self {
            provider,
            wallet,
            cache: DashMap::new(),
        }
    }

    pub fn wallet(&self) -> Address {
        self.wallet
    }

    /// Load a token: cached metadata plus a fresh balance read.
    pub async fn load(&self, address: Address) -> Result<Token> {
        let meta = self.meta(address).await?;
        let balance = self.balance_of(address).await?;
        Ok(Token {
            address,
            symbol: meta.symbol,
            decimals: meta.decimals,
            cached_balance: balance,
        })
    }

    /// Fresh wallet balance for a token.
    pub async fn balance_of(&self, address: Address) -> Result<U256> {
        let erc20 = IERC20::new(address, self.provider.clone());
        erc20
            .balanceOf(self.wallet)
            .call()
            .await
            .map_err(|e| rpc_err("balanceOf", e))
    }

    /// Re-read the wallet balance into the token's cache slot.
    pub async fn refresh_balance(&self, token: &mut Token) -> Result<U256> {
        let balance = self.balance_of(token.address).await?;
        token.cached_balance = balance;
        Ok(balance)
    }

    async fn meta(&self, address: Address) -> Result<TokenMeta> {
        if let Some(meta) = self.cache.get(&address) {
            return Ok(meta.clone());
        }

        let erc20 = IERC20::new(address, self.provider.clone());
        let symbol_call = erc20.symbol();
        let decimals_call = erc20.decimals();
        // Independent view calls, safe to run concurrently
        let (symbol_res, decimals_res) = tokio::join!(symbol_call.call(), decimals_call.call());

        let symbol = symbol_res.map_err(|e| rpc_err("symbol", e))?;
        let decimals = decimals_res.map_err(|e| rpc_err("decimals", e))?;

        debug!("Token metadata loaded: {} ({} decimals) at {}", symbol, decimals, address);

        let meta = TokenMeta { symbol, decimals };
        self.cache.insert(address, meta.clone());
        Ok(meta)
    }
}
