//! Gas Fee Policy
//!
//! EIP-1559 fee shaping for every transaction the engine submits. Network
//! fee estimates are scaled by a multiplier and floored at a chain-specific
//! minimum priority fee; the max fee is kept at no less than twice the
//! effective priority fee so a base-fee spike between estimation and
//! inclusion does not strand the transaction.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

pub const GWEI: u128 = 1_000_000_000;

/// Fee and gas-limit policy applied to every submitted transaction.
#[derive(Debug, Clone)]
pub struct GasPolicy {
    /// Chain-dependent floor for the priority fee (wei)
    pub min_priority_fee_per_gas: u128,
    /// Scaling applied to the network fee estimate
    pub fee_multiplier: f64,
    /// Percent added on top of the gas estimate
    pub gas_limit_buffer_percent: u64,
    /// Flat gas added after the percentage buffer
    pub fixed_gas_overhead: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            min_priority_fee_per_gas: GWEI,
            fee_multiplier: 1.2,
            gas_limit_buffer_percent: 30,
            fixed_gas_overhead: 50_000,
        }
    }
}

impl GasPolicy {
    /// Shape a network EIP-1559 estimate into the (max_fee, priority_fee)
    /// actually submitted.
    pub fn effective_fees(
        &self,
        network_max_fee: u128,
        network_priority_fee: u128,
    ) -> (u128, u128) {
        let priority = scale(network_priority_fee, self.fee_multiplier)
            .max(self.min_priority_fee_per_gas);
        let max_fee = scale(network_max_fee, self.fee_multiplier).max(priority * 2);
        (max_fee, priority)
    }

    /// Gas limit for a transaction given the node's estimate.
    pub fn buffered_gas_limit(&self, estimate: u64) -> u64 {
        estimate
            .saturating_mul(100 + self.gas_limit_buffer_percent)
            / 100
            + self.fixed_gas_overhead
    }
}

fn scale(fee: u128, multiplier: f64) -> u128 {
    if multiplier <= 1.0 {
        return fee;
    }
    (fee as f64 * multiplier) as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_floor() {
        let policy = GasPolicy {
            min_priority_fee_per_gas: 30 * GWEI,
            fee_multiplier: 1.0,
            ..Default::default()
        };
        // Network reports a priority fee below the chain minimum
        let (max_fee, priority) = policy.effective_fees(10 * GWEI, GWEI);
        assert_eq!(priority, 30 * GWEI);
        assert!(max_fee >= 2 * priority);
    }

    #[test]
    fn test_max_fee_at_least_twice_priority() {
        let policy = GasPolicy::default();
        let (max_fee, priority) = policy.effective_fees(GWEI, 5 * GWEI);
        assert!(max_fee >= 2 * priority);
    }

    #[test]
    fn test_multiplier_applied() {
        let policy = GasPolicy {
            min_priority_fee_per_gas: 1,
            fee_multiplier: 1.5,
            ..Default::default()
        };
        let (max_fee, priority) = policy.effective_fees(100 * GWEI, 10 * GWEI);
        assert_eq!(priority, 15 * GWEI);
        assert_eq!(max_fee, 150 * GWEI);
    }

    #[test]
    fn test_buffered_gas_limit() {
        let policy = GasPolicy {
            gas_limit_buffer_percent: 30,
            fixed_gas_overhead: 50_000,
            ..Default::default()
        };
        // 200k estimate -> 260k + 50k overhead
        assert_eq!(policy.buffered_gas_limit(200_000), 310_000);
    }
}
