//! Venue quote types

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

use super::TokenInfo;

/// Pool liquidity observed when the quote was captured, normalized to
/// human units.
#[derive(Debug, Clone, Copy)]
pub struct LiquiditySnapshot {
    pub reserve_in: Decimal,
    pub reserve_out: Decimal,
}

/// A single indicative exchange rate from one venue. Immutable once
/// captured; callers decide freshness via `is_fresh`.
#[derive(Debug, Clone)]
pub struct Quote {
    pub venue_id: String,
    pub token_in: TokenInfo,
    pub token_out: TokenInfo,
    pub amount_in: U256,
    pub amount_out: U256,
    /// Normalized token_out per token_in.
    pub price: Decimal,
    /// Per-leg trading fee applicable to this quote, in basis points.
    pub fee_bps: u32,
    pub liquidity: Option<LiquiditySnapshot>,
    /// Concentrated-liquidity tier that answered, if any.
    pub fee_tier: Option<u32>,
    pub captured_at: Instant,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() <= window
    }
}
