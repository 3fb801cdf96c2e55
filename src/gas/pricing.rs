//! Urgency-adjusted gas pricing
//!
//! Two modes, chosen by configuration: fee-market chains price with a
//! base fee plus an urgency-multiplied priority fee, legacy chains
//! multiply the network gas price directly. Any query failure falls
//! back to a fixed conservative price rather than blocking a decision.

use alloy::providers::Provider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::debug;

use crate::{
    config::{
        DEFAULT_GAS_LIMIT, FALLBACK_GAS_PRICE_GWEI, GAS_LIMIT_MARGIN_PCT, MAX_FEE_HEADROOM,
    },
    types::{ExecutionUrgency, GasFees, GasSettings},
    utils::{gwei_to_wei, wei_to_gwei, wei_to_native},
    ConcreteProvider,
};

#[async_trait]
pub trait GasFeeCalls: Send + Sync {
    /// Network gas price for legacy pricing, in wei.
    async fn legacy_gas_price(&self) -> Result<u128>;
    /// (base fee, suggested priority fee) for fee-market pricing, in wei.
    async fn fee_market_estimate(&self) -> Result<(u128, u128)>;
}

pub struct RpcGasFeeCalls {
    provider: Arc<ConcreteProvider>,
}

impl RpcGasFeeCalls {
    pub fn new(provider: Arc<ConcreteProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl GasFeeCalls for RpcGasFeeCalls {
    async fn legacy_gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .context("Failed to fetch gas price")
    }

    async fn fee_market_estimate(&self) -> Result<(u128, u128)> {
        let estimate = self
            .provider
            .estimate_eip1559_fees(None)
            .await
            .context("Failed to estimate fee-market fees")?;
        // The default estimator prices max fee at 2x base plus the
        // priority fee; recover the base fee from that headroom.
        let priority = estimate.max_priority_fee_per_gas;
        let base = estimate.max_fee_per_gas.saturating_sub(priority) / 2;
        Ok((base, priority))
    }
}

pub struct GasPricingStrategy {
    calls: Arc<dyn GasFeeCalls>,
    fee_market: bool,
}

impl GasPricingStrategy {
    pub fn new(calls: Arc<dyn GasFeeCalls>, fee_market: bool) -> Self {
        Self { calls, fee_market }
    }

    /// Effective gas price used for profitability scoring and the
    /// pre-submit drift check, in gwei. Falls back instead of failing.
    pub async fn current_gas_price_gwei(&self) -> Decimal {
        let wei = if self.fee_market {
            match self.calls.fee_market_estimate().await {
                Ok((base, priority)) => base + priority,
                Err(e) => {
                    debug!("Fee estimate unavailable, using fallback: {e:#}");
                    return FALLBACK_GAS_PRICE_GWEI;
                }
            }
        } else {
            match self.calls.legacy_gas_price().await {
                Ok(price) => price,
                Err(e) => {
                    debug!("Gas price unavailable, using fallback: {e:#}");
                    return FALLBACK_GAS_PRICE_GWEI;
                }
            }
        };
        wei_to_gwei(wei)
    }

    /// Fee fields and cost estimate for one submission at the given
    /// urgency. `gas_estimate` is the simulated gas use when available;
    /// the limit adds the configured safety margin on top, or uses the
    /// hardcoded ceiling when estimation failed.
    pub async fn gas_settings(
        &self,
        urgency: ExecutionUrgency,
        gas_estimate: Option<u64>,
    ) -> GasSettings {
        let multiplier = urgency.multiplier();
        let gas_limit = padded_gas_limit(gas_estimate);

        let fees = if self.fee_market {
            match self.calls.fee_market_estimate().await {
                Ok((base_fee, suggested_priority)) => {
                    fee_market_fees(base_fee, suggested_priority, multiplier)
                }
                Err(e) => {
                    debug!("Fee estimate unavailable, using fallback: {e:#}");
                    fallback_fees(multiplier)
                }
            }
        } else {
            match self.calls.legacy_gas_price().await {
                Ok(gas_price) => legacy_fees(gas_price, multiplier),
                Err(e) => {
                    debug!("Gas price unavailable, using fallback: {e:#}");
                    fallback_fees(multiplier)
                }
            }
        };

        let effective = fees.effective_price();
        GasSettings {
            fees,
            gas_limit,
            estimated_cost_native: wei_to_native(effective.saturating_mul(gas_limit as u128)),
            effective_price_gwei: wei_to_gwei(effective),
        }
    }
}

/// Priority fee scales with urgency; max fee adds headroom over base
/// plus priority and is floored so it can never undercut the priority
/// fee itself.
fn fee_market_fees(base_fee: u128, suggested_priority: u128, multiplier: Decimal) -> GasFees {
    let priority = scale(suggested_priority, multiplier);
    let max_fee = scale(base_fee + priority, MAX_FEE_HEADROOM).max(priority);
    GasFees::Eip1559 {
        max_fee_per_gas: max_fee,
        max_priority_fee_per_gas: priority,
    }
}

fn legacy_fees(gas_price: u128, multiplier: Decimal) -> GasFees {
    GasFees::Legacy {
        gas_price: scale(gas_price, multiplier),
    }
}

fn fallback_fees(multiplier: Decimal) -> GasFees {
    GasFees::Legacy {
        gas_price: scale(gwei_to_wei(FALLBACK_GAS_PRICE_GWEI), multiplier),
    }
}

fn scale(wei: u128, multiplier: Decimal) -> u128 {
    (Decimal::from_u128(wei).unwrap_or(Decimal::MAX) * multiplier)
        .trunc()
        .to_u128()
        .unwrap_or(wei)
}

fn padded_gas_limit(gas_estimate: Option<u64>) -> u64 {
    match gas_estimate {
        Some(estimate) => {
            let margin = (Decimal::from(estimate) * GAS_LIMIT_MARGIN_PCT / dec!(100))
                .trunc()
                .to_u64()
                .unwrap_or(0);
            estimate + margin
        }
        None => DEFAULT_GAS_LIMIT,
    }
}

#[cfg(test)]
pub mod tests_support {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct MockGasFeeCalls {
        pub legacy_wei: Option<u128>,
        pub fee_market: Option<(u128, u128)>,
        pub fail: bool,
    }

    #[async_trait]
    impl GasFeeCalls for MockGasFeeCalls {
        async fn legacy_gas_price(&self) -> Result<u128> {
            if self.fail {
                anyhow::bail!("rpc unavailable");
            }
            self.legacy_wei.ok_or_else(|| anyhow::anyhow!("no data"))
        }

        async fn fee_market_estimate(&self) -> Result<(u128, u128)> {
            if self.fail {
                anyhow::bail!("rpc unavailable");
            }
            self.fee_market.ok_or_else(|| anyhow::anyhow!("no data"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::MockGasFeeCalls;
    use super::*;

    const GWEI: u128 = 1_000_000_000;

    #[tokio::test]
    async fn fee_market_scales_priority_with_urgency() {
        let calls = MockGasFeeCalls {
            fee_market: Some((20 * GWEI, 2 * GWEI)),
            ..Default::default()
        };
        let strategy = GasPricingStrategy::new(Arc::new(calls), true);

        let standard = strategy.gas_settings(ExecutionUrgency::Standard, None).await;
        let urgent = strategy.gas_settings(ExecutionUrgency::Urgent, None).await;

        let (std_max, std_priority) = match standard.fees {
            GasFees::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => (max_fee_per_gas, max_priority_fee_per_gas),
            _ => panic!("expected fee-market fees"),
        };
        let (urg_max, urg_priority) = match urgent.fees {
            GasFees::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => (max_fee_per_gas, max_priority_fee_per_gas),
            _ => panic!("expected fee-market fees"),
        };

        // 1.2x and 2.0x of the suggested 2 gwei tip.
        assert_eq!(std_priority, 2_400_000_000);
        assert_eq!(urg_priority, 4 * GWEI);
        assert!(std_max >= std_priority);
        assert!(urg_max > std_max);
    }

    #[tokio::test]
    async fn max_fee_never_undercuts_priority_fee() {
        // Degenerate chain state: negligible base fee, huge tip.
        let calls = MockGasFeeCalls {
            fee_market: Some((1, 100 * GWEI)),
            ..Default::default()
        };
        let strategy = GasPricingStrategy::new(Arc::new(calls), true);
        let settings = strategy.gas_settings(ExecutionUrgency::Urgent, None).await;

        match settings.fees {
            GasFees::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => assert!(max_fee_per_gas >= max_priority_fee_per_gas),
            _ => panic!("expected fee-market fees"),
        }
    }

    #[tokio::test]
    async fn legacy_mode_multiplies_network_price() {
        let calls = MockGasFeeCalls {
            legacy_wei: Some(10 * GWEI),
            ..Default::default()
        };
        let strategy = GasPricingStrategy::new(Arc::new(calls), false);
        let settings = strategy.gas_settings(ExecutionUrgency::Fast, None).await;

        assert_eq!(
            settings.fees,
            GasFees::Legacy {
                gas_price: 15 * GWEI
            }
        );
    }

    #[tokio::test]
    async fn failure_falls_back_to_conservative_default() {
        let calls = MockGasFeeCalls {
            fail: true,
            ..Default::default()
        };
        let strategy = GasPricingStrategy::new(Arc::new(calls), true);

        assert_eq!(
            strategy.current_gas_price_gwei().await,
            FALLBACK_GAS_PRICE_GWEI
        );

        let settings = strategy.gas_settings(ExecutionUrgency::Slow, None).await;
        assert_eq!(
            settings.fees,
            GasFees::Legacy {
                gas_price: 20 * GWEI
            }
        );
    }

    #[tokio::test]
    async fn gas_limit_pads_estimate_and_defaults_on_none() {
        let calls = MockGasFeeCalls {
            legacy_wei: Some(GWEI),
            ..Default::default()
        };
        let strategy = GasPricingStrategy::new(Arc::new(calls), false);

        let padded = strategy
            .gas_settings(ExecutionUrgency::Standard, Some(500_000))
            .await;
        assert_eq!(padded.gas_limit, 600_000);

        let fallback = strategy.gas_settings(ExecutionUrgency::Standard, None).await;
        assert_eq!(fallback.gas_limit, DEFAULT_GAS_LIMIT);
    }
}
