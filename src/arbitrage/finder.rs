//! Cross-venue opportunity detection
//!
//! Quotes are collected concurrently from every configured venue, then
//! optionally sanity-checked against the oracle's implied cross-rate,
//! and the widest buy-low/sell-high pairing is emitted when its spread
//! clears the configured minimum.

use alloy::primitives::U256;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::{
    oracle::PriceOracle,
    types::{Opportunity, Quote, TradingPair},
    utils::to_decimal,
    venues::VenueQuoteProvider,
};

pub struct OpportunityFinder {
    venues: Arc<VenueQuoteProvider>,
    oracle: Arc<PriceOracle>,
    min_spread_pct: Decimal,
    oracle_deviation_pct: Decimal,
}

impl OpportunityFinder {
    pub fn new(
        venues: Arc<VenueQuoteProvider>,
        oracle: Arc<PriceOracle>,
        min_spread_pct: Decimal,
        oracle_deviation_pct: Decimal,
    ) -> Self {
        Self {
            venues,
            oracle,
            min_spread_pct,
            oracle_deviation_pct,
        }
    }

    /// Best raw spread across venues, without oracle validation.
    pub async fn find_opportunity(
        &self,
        pair: &TradingPair,
        amount_in: U256,
    ) -> Option<Opportunity> {
        let quotes = self.venues.collect_quotes(pair, amount_in).await;
        select_best(pair, quotes, self.min_spread_pct)
    }

    /// Best spread across venues whose rate agrees with the oracle's
    /// implied cross-rate. When oracle data is unavailable for either
    /// asset the validation step is skipped entirely and all raw quotes
    /// proceed.
    pub async fn find_opportunity_validated(
        &self,
        pair: &TradingPair,
        amount_in: U256,
    ) -> Option<Opportunity> {
        let quotes = self.venues.collect_quotes(pair, amount_in).await;
        if quotes.len() < 2 {
            debug!(
                pair = %pair.label(),
                venues = quotes.len(),
                "Not enough venues to arbitrage"
            );
            return None;
        }

        let quotes = match self.implied_cross_rate(pair).await {
            Some(rate) => {
                let before = quotes.len();
                let filtered = filter_by_oracle(quotes, rate, self.oracle_deviation_pct);
                if filtered.len() < before {
                    debug!(
                        pair = %pair.label(),
                        discarded = before - filtered.len(),
                        oracle_rate = %rate,
                        "Discarded quotes deviating from oracle rate"
                    );
                }
                filtered
            }
            None => quotes,
        };

        select_best(pair, quotes, self.min_spread_pct)
    }

    async fn implied_cross_rate(&self, pair: &TradingPair) -> Option<Decimal> {
        let base_usd = self.oracle.try_price(pair.base.symbol).await?;
        let quote_usd = self.oracle.try_price(pair.quote.symbol).await?;
        if quote_usd <= dec!(0) {
            return None;
        }
        Some(base_usd / quote_usd)
    }
}

/// Drop quotes whose price deviates from the oracle's implied rate by
/// more than the tolerance percentage.
pub fn filter_by_oracle(
    quotes: Vec<Quote>,
    implied_rate: Decimal,
    tolerance_pct: Decimal,
) -> Vec<Quote> {
    if implied_rate <= dec!(0) {
        return quotes;
    }
    quotes
        .into_iter()
        .filter(|quote| {
            let deviation_pct = ((quote.price - implied_rate).abs() / implied_rate) * dec!(100);
            deviation_pct <= tolerance_pct
        })
        .collect()
}

/// Pick the buy (lowest price) and sell (highest price) venues and emit
/// an opportunity when the spread clears the minimum. Ties at either
/// extreme resolve lexicographically by venue id.
pub fn select_best(
    pair: &TradingPair,
    quotes: Vec<Quote>,
    min_spread_pct: Decimal,
) -> Option<Opportunity> {
    if quotes.len() < 2 {
        return None;
    }

    let mut sorted = quotes;
    sorted.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then_with(|| a.venue_id.cmp(&b.venue_id))
    });

    let buy = sorted.first()?.clone();
    let max_price = sorted.last()?.price;
    let sell = sorted
        .iter()
        .filter(|q| q.price == max_price)
        .min_by(|a, b| a.venue_id.cmp(&b.venue_id))?
        .clone();

    if sell.price <= buy.price {
        return None;
    }

    let spread_pct = (sell.price - buy.price) / buy.price * dec!(100);
    if spread_pct < min_spread_pct {
        debug!(
            pair = %pair.label(),
            spread = %spread_pct,
            minimum = %min_spread_pct,
            "Spread below minimum threshold"
        );
        return None;
    }

    let trade_size = to_decimal(buy.amount_in, pair.base.decimals)?;

    Some(Opportunity {
        id: uuid::Uuid::new_v4().to_string(),
        pair: *pair,
        buy_venue: buy.venue_id.clone(),
        sell_venue: sell.venue_id.clone(),
        spread_pct,
        borrow_amount: trade_size * buy.price,
        borrow_amount_raw: buy.amount_out,
        trade_size,
        buy_quote: buy,
        sell_quote: sell,
        discovered_at: Instant::now(),
        timestamp: Utc::now(),
    })
}
