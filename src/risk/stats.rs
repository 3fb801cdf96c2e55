//! Process-wide daily stats and circuit breaker state
//!
//! A single instance is created at startup and handed to the risk
//! manager; the day rollover happens through an explicit check at the
//! top of every assessment rather than a background timer, so tests can
//! drive it deterministically.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Realized outcomes for one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyRiskStats {
    pub day: NaiveDate,
    pub realized_profit_usd: Decimal,
    pub realized_loss_usd: Decimal,
    pub trades_attempted: u32,
    pub trades_succeeded: u32,
    pub trades_failed: u32,
    pub consecutive_failures: u32,
}

impl DailyRiskStats {
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            day,
            realized_profit_usd: dec!(0),
            realized_loss_usd: dec!(0),
            trades_attempted: 0,
            trades_succeeded: 0,
            trades_failed: 0,
            consecutive_failures: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerState {
    pub active: bool,
    pub activated_at: Option<Instant>,
}

impl CircuitBreakerState {
    pub fn closed() -> Self {
        Self {
            active: false,
            activated_at: None,
        }
    }
}

/// The one mutable state object shared between assessments and
/// post-execution feedback.
#[derive(Debug)]
pub struct RiskState {
    pub daily: DailyRiskStats,
    pub breaker: CircuitBreakerState,
}

pub type SharedRiskState = Arc<RwLock<RiskState>>;

impl RiskState {
    pub fn new() -> Self {
        Self {
            daily: DailyRiskStats::for_day(Local::now().date_naive()),
            breaker: CircuitBreakerState::closed(),
        }
    }

    pub fn shared() -> SharedRiskState {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Reset the daily counters when the local calendar day has rolled
    /// over. The breaker is deliberately untouched; failures do not
    /// amnesty at midnight.
    pub fn reset_if_new_day(&mut self) {
        let today = Local::now().date_naive();
        if self.daily.day != today {
            self.daily = DailyRiskStats::for_day(today);
        }
    }
}

impl Default for RiskState {
    fn default() -> Self {
        Self::new()
    }
}
