//! Pool Management
//!
//! Pool lifecycle (existence, creation, minting, verification) and the
//! fixed-point sqrt price / tick math backing it.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

pub mod lifecycle;
pub mod sqrt_price;

pub use lifecycle::{MintResult, PoolLifecycleManager};
