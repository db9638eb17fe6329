//! Proposal Token Resolution
//!
//! Resolves a futarchy proposal's conditional token set (YES/NO wrappers
//! for both collaterals) from the proposal contract's accessors. When an
//! accessor is unreadable — older proposal deployments don't expose it —
//! a probe-split discovery fallback splits one smallest collateral unit
//! through the adapter and classifies the tokens that arrive in the
//! receipt by symbol.
//!
//! Slots that survive both paths unresolved stay `None`; only the pools
//! that reference them fail, later and explicitly.
//!
//! Author: AI-Generated
//! Created: 2026-08-12
//! Modified: 2026-08-13 — probe-split fallback

use crate::conditional::ConditionalTokenManager;
use crate::contracts::{IERC20, IFutarchyProposal};
use crate::error::Result;
use crate::tokens::TokenRegistry;
use crate::types::{Proposal, Token};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionReceipt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// wrappedOutcome slot layout on the proposal contract:
/// 0 = YES-collateral1, 1 = NO-collateral1, 2 = YES-collateral2,
/// 3 = NO-collateral2 (collateral1 = company, collateral2 = currency).
const SLOT_YES_COMPANY: u64 = 0;
const SLOT_NO_COMPANY: u64 = 1;
const SLOT_YES_CURRENCY: u64 = 2;
const SLOT_NO_CURRENCY: u64 = 3;

pub struct ProposalLoader<'a, P> {
    provider: Arc<P>,
    registry: &'a TokenRegistry<P>,
}

impl<'a, P: Provider + Clone + 'static> ProposalLoader<'a, P> {
    pub fn new(provider: Arc<P>, registry: &'a TokenRegistry<P>) -> Self {
        Self { provider, registry }
    }

    /// Load the proposal's token set through the contract accessors.
    /// Unreadable conditional slots are left `None` and logged; collateral
    /// legs must load or the whole call fails.
    pub async fn load(
        &self,
        proposal_address: Address,
        company_address: Address,
        currency_address: Address,
    ) -> Result<Proposal> {
        let company = self.registry.load(company_address).await?;
        let currency = self.registry.load(currency_address).await?;

        let contract = IFutarchyProposal::new(proposal_address, self.provider.clone());

        // Cross-check the supplied collaterals against the contract when
        // the accessors respond; a mismatch is worth a warning, not a stop
        match contract.collateralToken1().call().await {
            Ok(c1) if c1 != company_address => {
                warn!(
                    "Proposal collateralToken1 {} differs from supplied company token {}",
                    c1, company_address
                );
            }
            Ok(_) => {}
            Err(e) => debug!("collateralToken1 unreadable: {e}"),
        }
        match contract.collateralToken2().call().await {
            Ok(c2) if c2 != currency_address => {
                warn!(
                    "Proposal collateralToken2 {} differs from supplied currency token {}",
                    c2, currency_address
                );
            }
            Ok(_) => {}
            Err(e) => debug!("collateralToken2 unreadable: {e}"),
        }

        let opening_time = match contract.marketOpeningTime().call().await {
            Ok(t) => t.try_into().unwrap_or(0),
            Err(e) => {
                debug!("marketOpeningTime unreadable: {e}");
                0
            }
        };

        let yes_company = self.wrapped_token(proposal_address, SLOT_YES_COMPANY).await;
        let no_company = self.wrapped_token(proposal_address, SLOT_NO_COMPANY).await;
        let yes_currency = self.wrapped_token(proposal_address, SLOT_YES_CURRENCY).await;
        let no_currency = self.wrapped_token(proposal_address, SLOT_NO_CURRENCY).await;

        let proposal = Proposal {
            address: proposal_address,
            company,
            currency,
            yes_company,
            no_company,
            yes_currency,
            no_currency,
            opening_time,
        };

        info!(
            "Proposal {} loaded: {} / {} ({} of 4 conditional slots resolved)",
            proposal_address,
            proposal.company.symbol,
            proposal.currency.symbol,
            proposal.resolved_slot_count()
        );
        Ok(proposal)
    }

    async fn wrapped_token(&self, proposal_address: Address, slot: u64) -> Option<Token> {
        let contract = IFutarchyProposal::new(proposal_address, self.provider.clone());
        let outcome = match contract.wrappedOutcome(U256::from(slot)).call().await {
            Ok(o) => o,
            Err(e) => {
                warn!("wrappedOutcome({slot}) unreadable: {e}");
                return None;
            }
        };
        if outcome.wrapped1155 == Address::ZERO {
            warn!("wrappedOutcome({slot}) returned the zero address");
            return None;
        }
        match self.registry.load(outcome.wrapped1155).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("conditional token {} failed to load: {e}", outcome.wrapped1155);
                None
            }
        }
    }

    /// Discovery fallback for unresolved conditional slots: split one
    /// smallest unit of the affected collateral and classify the tokens
    /// credited to the wallet in the receipt by YES/NO symbol substring.
    /// Best-effort; unclassifiable slots remain `None`.
    pub async fn discover_missing(
        &self,
        splitter: &ConditionalTokenManager<P>,
        proposal: &mut Proposal,
    ) -> Result<()> {
        if proposal.yes_company.is_none() || proposal.no_company.is_none() {
            let company = proposal.company.clone();
            let (yes, no) = self
                .probe_split(splitter, proposal.address, &company)
                .await?;
            proposal.yes_company = proposal.yes_company.take().or(yes);
            proposal.no_company = proposal.no_company.take().or(no);
        }
        if proposal.yes_currency.is_none() || proposal.no_currency.is_none() {
            let currency = proposal.currency.clone();
            let (yes, no) = self
                .probe_split(splitter, proposal.address, &currency)
                .await?;
            proposal.yes_currency = proposal.yes_currency.take().or(yes);
            proposal.no_currency = proposal.no_currency.take().or(no);
        }
        Ok(())
    }

    async fn probe_split(
        &self,
        splitter: &ConditionalTokenManager<P>,
        proposal_address: Address,
        collateral: &Token,
    ) -> Result<(Option<Token>, Option<Token>)> {
        info!(
            "🔍 Probing conditional tokens for {} via 1-unit split",
            collateral.symbol
        );
        let (_, receipt) = splitter
            .split_tokens(proposal_address, collateral.address, U256::from(1))
            .await?;

        let mut yes = None;
        let mut no = None;
        for candidate in self.incoming_token_addresses(&receipt, collateral.address) {
            let token = match self.registry.load(candidate).await {
                Ok(t) => t,
                Err(e) => {
                    debug!("probe candidate {} failed to load: {e}", candidate);
                    continue;
                }
            };
            let symbol_upper = token.symbol.to_uppercase();
            if symbol_upper.contains("YES") && yes.is_none() {
                debug!("Classified {} as YES wrapper", token.symbol);
                yes = Some(token);
            } else if symbol_upper.contains("NO") && no.is_none() {
                debug!("Classified {} as NO wrapper", token.symbol);
                no = Some(token);
            } else {
                warn!("Unclassifiable probe token {} ({})", token.symbol, token.address);
            }
        }

        if yes.is_none() || no.is_none() {
            warn!(
                "⚠️ Probe split for {} left slots unresolved (YES {}, NO {})",
                collateral.symbol,
                yes.is_some(),
                no.is_some()
            );
        }
        Ok((yes, no))
    }

    /// Token contracts that credited the wallet in this receipt, excluding
    /// the collateral itself (which only debits during a split).
    fn incoming_token_addresses(
        &self,
        receipt: &TransactionReceipt,
        collateral: Address,
    ) -> Vec<Address> {
        let wallet = self.registry.wallet();
        let mut seen = Vec::new();
        for log in receipt.inner.logs() {
            if let Ok(decoded) = log.log_decode::<IERC20::Transfer>() {
                let emitter = decoded.inner.address;
                if decoded.inner.data.to == wallet
                    && emitter != collateral
                    && !seen.contains(&emitter)
                {
                    seen.push(emitter);
                }
            }
        }
        seen
    }
}

impl Proposal {
    pub fn resolved_slot_count(&self) -> usize {
        [
            self.yes_company.is_some(),
            self.no_company.is_some(),
            self.yes_currency.is_some(),
            self.no_currency.is_some(),
        ]
        .iter()
        .filter(|r| **r)
        .count()
    }
}
