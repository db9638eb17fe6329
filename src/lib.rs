//! Futarchy Liquidity Seeder Library
//!
//! Provides components for provisioning the six AMM pools of a futarchy
//! conditional-token market: price model, conditional token supply
//! management, pool lifecycle, and the run orchestrator.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

pub mod amounts;
pub mod conditional;
pub mod config;
pub mod contracts;
pub mod error;
pub mod gas;
pub mod ordering;
pub mod orchestrator;
pub mod pool;
pub mod pricing;
pub mod proposal;
pub mod tokens;
pub mod txn;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, load_config_from_file, ChainConfig};
pub use error::{ProvisionError, Result};
pub use orchestrator::LiquidityOrchestrator;
pub use types::{AmmVariant, PoolOutcome, PoolStatus, Proposal, ProposalInput};
