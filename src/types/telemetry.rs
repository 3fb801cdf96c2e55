//! Telemetry snapshot and alert types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Point-in-time view of the rolling performance counters.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PerformanceSnapshot {
    pub opportunities_found: u64,
    pub trades_attempted: u64,
    pub trades_succeeded: u64,
    pub trades_failed: u64,
    pub cumulative_profit_usd: Decimal,
    pub cumulative_gas_cost_usd: Decimal,
    pub avg_execution_latency_ms: f64,
    pub success_rate_pct: f64,
    pub error_rate_pct: f64,
    pub opportunities_per_hour: f64,
    pub profit_per_hour_usd: Decimal,
    pub avg_margin_pct: Decimal,
    pub quote_cache_hits: u64,
    pub quote_cache_misses: u64,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    LowSuccessRate,
    HighErrorRate,
    SlowExecution,
    ThinMargins,
}

/// Advisory only. Alerts surface through logs and never gate execution;
/// blocking is the risk manager's job.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}
