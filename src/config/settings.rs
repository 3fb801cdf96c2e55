//! Engine configuration and environment variable handling

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::config::venues::{default_pairs, default_venues, VenueConfig};
use crate::types::TradingPair;

// Trade sizing bounds, in base-asset units
pub const MIN_TRADE_SIZE: Decimal = dec!(0.01);
pub const MAX_TRADE_SIZE: Decimal = dec!(10.0);

// Quote handling
pub const QUOTE_CACHE_TTL_SECS: u64 = 5;
pub const QUOTE_FRESHNESS_SECS: u64 = 15;
pub const QUOTE_CALL_TIMEOUT_SECS: u64 = 3;

// Oracle handling
pub const ORACLE_CACHE_TTL_SECS: u64 = 30;
pub const ORACLE_STALENESS_SECS: u64 = 3600;
pub const ORACLE_CALL_TIMEOUT_SECS: u64 = 3;

// Flashloan economics
pub const FLASHLOAN_PREMIUM_RATE: Decimal = dec!(0.0009); // 0.09%

// Gas accounting, units
pub const GAS_FLASHLOAN_BASE: u64 = 220_000;
pub const GAS_PER_SWAP: u64 = 150_000;
pub const GAS_SAFETY_BUFFER: u64 = 50_000;
pub const DEFAULT_GAS_LIMIT: u64 = 800_000;
pub const GAS_LIMIT_MARGIN_PCT: Decimal = dec!(20);
pub const FALLBACK_GAS_PRICE_GWEI: Decimal = dec!(20);
pub const MAX_FEE_HEADROOM: Decimal = dec!(1.25);

#[derive(Debug, Clone)]
pub struct RiskSettings {
    pub emergency_stop: bool,
    /// Margin floor used by the risk factor accumulation.
    pub min_margin_pct: Decimal,
    /// Largest borrow size allowed, in quote-asset units.
    pub max_position_size: Decimal,
    pub max_slippage_bps: u32,
    pub max_daily_loss_usd: Decimal,
    pub max_gas_price_gwei: Decimal,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_secs: u64,
    pub max_risk_score: u8,
}

#[derive(Debug, Clone)]
pub struct ProfitabilitySettings {
    pub min_profit_usd: Decimal,
    pub min_margin_pct: Decimal,
    pub max_risk_score: u8,
}

#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub enabled: bool,
    pub cooldown_secs: u64,
    /// Reject if the live gas price drifted above the scored price by
    /// more than this percentage.
    pub gas_drift_limit_pct: Decimal,
    pub slippage_tolerance_bps: u32,
    pub confirmation_timeout_secs: u64,
    pub fee_market: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: Option<String>,
    /// Flashloan size per scan, in base-asset units.
    pub trade_size: Decimal,
    pub scan_interval_secs: u64,
    pub min_spread_pct: Decimal,
    pub oracle_deviation_pct: Decimal,
    pub risk: RiskSettings,
    pub profitability: ProfitabilitySettings,
    pub execution: ExecutionSettings,
    pub settlement_contract: Option<Address>,
    pub executor_account: Option<Address>,
    pub private_key: Option<String>,
    pub venues: Vec<VenueConfig>,
    pub pairs: Vec<TradingPair>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            rpc_url: env::var("RPC_URL").ok(),
            trade_size: env::var("TRADE_SIZE")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(1.0))
                .max(MIN_TRADE_SIZE)
                .min(MAX_TRADE_SIZE),
            scan_interval_secs: env::var("SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3)
                .max(1),
            min_spread_pct: env::var("MIN_SPREAD_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(0.5))
                .max(dec!(0.05)),
            oracle_deviation_pct: env::var("ORACLE_DEVIATION_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(5)),
            risk: RiskSettings {
                emergency_stop: env::var("EMERGENCY_STOP")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
                min_margin_pct: env::var("MIN_MARGIN_PCT")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(0.5)),
                max_position_size: env::var("MAX_POSITION_SIZE")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(50000)),
                max_slippage_bps: env::var("MAX_SLIPPAGE_BPS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
                max_daily_loss_usd: env::var("MAX_DAILY_LOSS_USD")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(500)),
                max_gas_price_gwei: env::var("MAX_GAS_PRICE_GWEI")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(150)),
                circuit_breaker_threshold: env::var("CIRCUIT_BREAKER_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3)
                    .max(1),
                circuit_breaker_cooldown_secs: env::var("CIRCUIT_BREAKER_COOLDOWN_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
                max_risk_score: 70,
            },
            profitability: ProfitabilitySettings {
                min_profit_usd: env::var("MIN_PROFIT_USD")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(10)),
                min_margin_pct: env::var("MIN_MARGIN_PCT")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(0.5)),
                max_risk_score: 70,
            },
            execution: ExecutionSettings {
                enabled: env::var("ENABLE_EXECUTION")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
                cooldown_secs: env::var("EXECUTION_COOLDOWN_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                gas_drift_limit_pct: env::var("GAS_DRIFT_LIMIT_PCT")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .unwrap_or(dec!(20)),
                slippage_tolerance_bps: env::var("SLIPPAGE_TOLERANCE_BPS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
                confirmation_timeout_secs: env::var("CONFIRMATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
                fee_market: env::var("FEE_MARKET")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .unwrap_or(true),
            },
            settlement_contract: env::var("SETTLEMENT_CONTRACT")
                .ok()
                .and_then(|s| Address::from_str(&s).ok()),
            executor_account: env::var("EXECUTOR_ACCOUNT")
                .ok()
                .and_then(|s| Address::from_str(&s).ok()),
            private_key: env::var("PRIVATE_KEY").ok(),
            venues: default_venues(),
            pairs: default_pairs(),
        }
    }

    /// Fatal-at-startup checks. Anything failing here is allowed to
    /// terminate the process; everything else degrades at runtime.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc_url.is_none() {
            anyhow::bail!("RPC_URL is required");
        }
        if self.venues.len() < 2 {
            anyhow::bail!(
                "at least 2 venues are required for arbitrage, {} configured",
                self.venues.len()
            );
        }
        if self.pairs.is_empty() {
            anyhow::bail!("no trading pairs configured");
        }
        if self.execution.enabled {
            if self.settlement_contract.is_none() {
                anyhow::bail!("SETTLEMENT_CONTRACT is required when execution is enabled");
            }
            if self.executor_account.is_none() {
                anyhow::bail!("EXECUTOR_ACCOUNT is required when execution is enabled");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        let config = Config::load();
        assert!(config.trade_size >= MIN_TRADE_SIZE);
        assert!(config.trade_size <= MAX_TRADE_SIZE);
        assert!(config.min_spread_pct > dec!(0));
        assert!(config.risk.circuit_breaker_threshold >= 1);
    }

    #[test]
    fn validate_rejects_missing_rpc_url() {
        let mut config = Config::load();
        config.rpc_url = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_settlement_contract_for_execution() {
        let mut config = Config::load();
        config.rpc_url = Some("http://localhost:8545".to_string());
        config.execution.enabled = true;
        config.settlement_contract = None;
        assert!(config.validate().is_err());
    }
}
