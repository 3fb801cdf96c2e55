//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Terminal value for one opportunity's lifecycle. Feeds the risk
/// manager's daily stats and the performance aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub id: String,
    pub opportunity_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub tx_hash: Option<String>,
    pub gas_used: Option<u64>,
    pub realized_profit_usd: Option<Decimal>,
    pub failure_reason: Option<String>,
    pub latency_ms: u64,
}

/// Outcome of an execution request. `Skipped` covers the pre-flight
/// rejections (another execution in flight, cooldown) that are not fed
/// back into the risk manager; `Completed` results always are.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Skipped { reason: SkipReason },
    Completed(ExecutionResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InProgress,
    CooldownActive { remaining_secs: u64 },
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            SkipReason::InProgress => "execution in progress".to_string(),
            SkipReason::CooldownActive { remaining_secs } => {
                format!("cooldown active, {}s remaining", remaining_secs)
            }
        }
    }
}

/// How aggressively a submission should bid for inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionUrgency {
    Slow,
    Standard,
    Fast,
    Urgent,
}

impl ExecutionUrgency {
    pub fn multiplier(&self) -> Decimal {
        match self {
            ExecutionUrgency::Slow => dec!(1.0),
            ExecutionUrgency::Standard => dec!(1.2),
            ExecutionUrgency::Fast => dec!(1.5),
            ExecutionUrgency::Urgent => dec!(2.0),
        }
    }
}

/// Fee fields for a submission, depending on whether the target chain
/// supports fee-market pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasFees {
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
    Legacy {
        gas_price: u128,
    },
}

impl GasFees {
    /// Price per gas unit actually budgeted for, in wei.
    pub fn effective_price(&self) -> u128 {
        match self {
            GasFees::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
            GasFees::Legacy { gas_price } => *gas_price,
        }
    }
}

/// Urgency-adjusted settings for one submission.
#[derive(Debug, Clone)]
pub struct GasSettings {
    pub fees: GasFees,
    pub gas_limit: u64,
    /// Worst-case cost at the budgeted price, in native currency.
    pub estimated_cost_native: Decimal,
    pub effective_price_gwei: Decimal,
}
