//! Futarchy Liquidity Seeder
//!
//! Main entry point. Reads a proposal description (JSON), connects the
//! signing provider, resolves the proposal's conditional token set, and
//! runs the six-pool provisioning sequence:
//!
//!   1. YES-company / YES-currency   2. NO-company / NO-currency
//!   3. YES-company / currency       4. NO-company / currency
//!   5. YES-currency / currency      6. NO-currency / currency
//!
//! Dry-run is the default; --live sends transactions.
//!
//! Author: AI-Generated
//! Created: 2026-08-10
//! Modified: 2026-08-14 — dry-run default, JSON summary output

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use futarchy_seeder::conditional::ConditionalTokenManager;
use futarchy_seeder::config::load_config_from_file;
use futarchy_seeder::orchestrator::LiquidityOrchestrator;
use futarchy_seeder::pool::PoolLifecycleManager;
use futarchy_seeder::proposal::ProposalLoader;
use futarchy_seeder::tokens::TokenRegistry;
use futarchy_seeder::types::{AmmVariant, Mode, ProposalInput};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn, Level};

/// Futarchy conditional-market liquidity seeder
#[derive(Parser)]
#[command(name = "futarchy-seeder")]
struct Args {
    /// Chain to run on (informational; .env supplies the endpoints)
    #[arg(short, long, env = "CHAIN", default_value = "gnosis")]
    chain: String,

    /// Path to the proposal input JSON
    #[arg(short, long)]
    proposal: String,

    /// Override the decision mode from the proposal file
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Send transactions (default is dry-run: log plans only)
    #[arg(long)]
    live: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();

    // Chain-specific .env file (e.g., .env.gnosis), plain .env fallback
    let chain = args.chain.to_lowercase();
    let env_file = format!(".env.{chain}");
    let mut config = load_config_from_file(&env_file)?;
    info!(
        "Futarchy Liquidity Seeder starting — chain: {} (chain_id: {})",
        chain, config.chain_id
    );

    let raw = std::fs::read_to_string(&args.proposal)
        .with_context(|| format!("reading proposal file {}", args.proposal))?;
    let mut input: ProposalInput =
        serde_json::from_str(&raw).context("parsing proposal JSON")?;
    if let Some(mode) = args.mode {
        input.mode = mode;
    }
    info!(
        "Proposal loaded: {} (spot {}, p {}, impact {}%)",
        input.market_name, input.spot_price, input.event_probability, input.impact
    );

    // Per-proposal overrides for fee tier and adapter
    if let (AmmVariant::FeeTiered { .. }, Some(fee)) = (config.amm_variant, input.fee_tier) {
        config.amm_variant = AmmVariant::FeeTiered { fee };
    }
    if let Some(adapter) = &input.adapter_address {
        config.adapter = Address::from_str(adapter).context("invalid adapterAddress")?;
    }

    let signer = PrivateKeySigner::from_str(&config.private_key).context("invalid PRIVATE_KEY")?;
    let wallet_address = signer.address();
    let wallet = EthereumWallet::from(signer);

    let url = config.rpc_url.parse().context("invalid RPC_URL")?;
    let provider = Arc::new(ProviderBuilder::new().wallet(wallet).connect_http(url));

    let chain_id = provider.get_chain_id().await.context("querying chain id")?;
    if chain_id != config.chain_id {
        anyhow::bail!(
            "RPC chain id {} does not match configured {}",
            chain_id,
            config.chain_id
        );
    }
    info!("Connected as {} (chain id {})", wallet_address, chain_id);

    let proposal_address =
        Address::from_str(&input.proposal_address).context("invalid proposalAddress")?;
    let company_address =
        Address::from_str(&input.company_token.address).context("invalid company token address")?;
    let currency_address = Address::from_str(&input.currency_token.address)
        .context("invalid currency token address")?;

    let registry = TokenRegistry::new(provider.clone(), wallet_address);
    let conditional = ConditionalTokenManager::new(
        provider.clone(),
        wallet_address,
        config.adapter,
        config.gas.clone(),
    );
    let lifecycle = PoolLifecycleManager::new(
        provider.clone(),
        wallet_address,
        config.amm_variant,
        config.factory,
        config.position_manager,
        config.gas.clone(),
        config.tick_range_steps,
    );

    let loader = ProposalLoader::new(provider.clone(), &registry);
    let mut proposal = loader
        .load(proposal_address, company_address, currency_address)
        .await?;
    if proposal.resolved_slot_count() < 4 {
        if args.live {
            info!("Conditional slots missing; attempting probe-split discovery");
            loader.discover_missing(&conditional, &mut proposal).await?;
        } else {
            warn!("Conditional slots missing; probe-split discovery needs --live");
        }
    }

    let orchestrator = LiquidityOrchestrator::new(registry, conditional, lifecycle, !args.live);
    let outcomes = orchestrator.run(&input, &proposal).await?;

    // Machine-readable summary for the calling pipeline
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}
