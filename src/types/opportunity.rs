//! Arbitrage opportunity types

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

use super::{Quote, TradingPair};

/// A candidate round trip: buy the base asset where it is cheap, sell it
/// where it is expensive, funded by a flashloan of the quote asset.
/// Derived from live quotes and never persisted past its decision
/// lifecycle.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub id: String,
    pub pair: TradingPair,
    pub buy_venue: String,
    pub buy_quote: Quote,
    pub sell_venue: String,
    pub sell_quote: Quote,
    /// (sell price - buy price) / buy price * 100.
    pub spread_pct: Decimal,
    /// Flashloan size in quote-asset units, normalized.
    pub borrow_amount: Decimal,
    /// Flashloan size in quote-asset raw units.
    pub borrow_amount_raw: U256,
    /// Base-asset size traded through both legs, normalized.
    pub trade_size: Decimal,
    pub discovered_at: Instant,
    pub timestamp: DateTime<Utc>,
}

impl Opportunity {
    pub fn age(&self) -> Duration {
        self.discovered_at.elapsed()
    }
}
