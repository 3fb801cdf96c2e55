//! Constant-product venue quoting
//!
//! A quote is only emitted when the factory actually knows the pair and
//! the pool holds enough base-side liquidity to be worth trading against.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::time::Instant;
use tracing::debug;

use crate::{
    config::VenueConfig,
    types::{LiquiditySnapshot, Quote, TradingPair},
    utils::to_decimal,
    venues::chain::QuoteCalls,
};

pub async fn quote_constant_product(
    calls: &dyn QuoteCalls,
    venue: &VenueConfig,
    router: Address,
    factory: Address,
    pair: &TradingPair,
    amount_in: U256,
) -> Result<Option<Quote>> {
    let pool = match calls
        .pair_for(factory, pair.base.address, pair.quote.address)
        .await?
    {
        Some(pool) => pool,
        None => {
            debug!(venue = %venue.id, pair = %pair.label(), "No pool registered");
            return Ok(None);
        }
    };

    let (r0, r1) = calls.reserves(pool).await?;
    if r0 == U256::ZERO || r1 == U256::ZERO {
        debug!(venue = %venue.id, pair = %pair.label(), "Pool has zero reserves");
        return Ok(None);
    }

    // Pair contracts order reserves by ascending token address.
    let (reserve_base, reserve_quote) = if pair.base.address < pair.quote.address {
        (r0, r1)
    } else {
        (r1, r0)
    };

    let reserve_in = match to_decimal(reserve_base, pair.base.decimals) {
        Some(v) => v,
        None => return Ok(None),
    };
    let reserve_out = match to_decimal(reserve_quote, pair.quote.decimals) {
        Some(v) => v,
        None => return Ok(None),
    };

    if reserve_in < venue.min_liquidity {
        debug!(
            venue = %venue.id,
            pair = %pair.label(),
            reserve = %reserve_in,
            floor = %venue.min_liquidity,
            "Liquidity below minimum, skipping venue"
        );
        return Ok(None);
    }

    let path = [pair.base.address, pair.quote.address];
    let amounts = calls.amounts_out(router, amount_in, &path).await?;
    let amount_out = match amounts.last() {
        Some(last) if *last > U256::ZERO => *last,
        _ => {
            debug!(venue = %venue.id, pair = %pair.label(), "Router returned zero output");
            return Ok(None);
        }
    };

    let in_norm = match to_decimal(amount_in, pair.base.decimals) {
        Some(v) if v > dec!(0) => v,
        _ => return Ok(None),
    };
    let out_norm = match to_decimal(amount_out, pair.quote.decimals) {
        Some(v) => v,
        None => return Ok(None),
    };

    Ok(Some(Quote {
        venue_id: venue.id.clone(),
        token_in: pair.base,
        token_out: pair.quote,
        amount_in,
        amount_out,
        price: out_norm / in_norm,
        fee_bps: venue.fee_bps,
        liquidity: Some(LiquiditySnapshot {
            reserve_in,
            reserve_out,
        }),
        fee_tier: None,
        captured_at: Instant::now(),
        timestamp: Utc::now(),
    }))
}
