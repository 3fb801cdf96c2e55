//! Concentrated-liquidity venue quoting
//!
//! Fee tiers are walked in configuration order and the first tier with a
//! positive output wins. Each attempt's outcome is kept as data so
//! diagnostics can show which tiers are actually viable.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::time::Instant;
use tracing::debug;

use crate::{
    config::{tier_fee_bps, VenueConfig},
    types::{Quote, TradingPair},
    utils::to_decimal,
    venues::chain::QuoteCalls,
};

#[derive(Debug, Clone)]
pub enum TierOutcome {
    Quoted(U256),
    ZeroOutput,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TierAttempt {
    pub tier: u32,
    pub outcome: TierOutcome,
}

pub async fn quote_concentrated(
    calls: &dyn QuoteCalls,
    venue: &VenueConfig,
    quoter: Address,
    fee_tiers: &[u32],
    pair: &TradingPair,
    amount_in: U256,
) -> Result<(Option<Quote>, Vec<TierAttempt>)> {
    let mut attempts = Vec::with_capacity(fee_tiers.len());
    let mut winner: Option<(u32, U256)> = None;

    for &tier in fee_tiers {
        match calls
            .quote_single(
                quoter,
                pair.base.address,
                pair.quote.address,
                tier,
                amount_in,
            )
            .await
        {
            Ok(amount_out) if amount_out > U256::ZERO => {
                attempts.push(TierAttempt {
                    tier,
                    outcome: TierOutcome::Quoted(amount_out),
                });
                winner = Some((tier, amount_out));
                break;
            }
            Ok(_) => {
                attempts.push(TierAttempt {
                    tier,
                    outcome: TierOutcome::ZeroOutput,
                });
            }
            Err(e) => {
                // Tiers with no initialized pool revert; that is data,
                // not an error.
                attempts.push(TierAttempt {
                    tier,
                    outcome: TierOutcome::Failed(e.to_string()),
                });
            }
        }
    }

    let (tier, amount_out) = match winner {
        Some(w) => w,
        None => {
            debug!(
                venue = %venue.id,
                pair = %pair.label(),
                attempts = ?attempts
                    .iter()
                    .map(|a| (a.tier, matches!(a.outcome, TierOutcome::Failed(_))))
                    .collect::<Vec<_>>(),
                "No fee tier produced output"
            );
            return Ok((None, attempts));
        }
    };

    let in_norm = match to_decimal(amount_in, pair.base.decimals) {
        Some(v) if v > dec!(0) => v,
        _ => return Ok((None, attempts)),
    };
    let out_norm = match to_decimal(amount_out, pair.quote.decimals) {
        Some(v) => v,
        None => return Ok((None, attempts)),
    };

    let quote = Quote {
        venue_id: venue.id.clone(),
        token_in: pair.base,
        token_out: pair.quote,
        amount_in,
        amount_out,
        price: out_norm / in_norm,
        fee_bps: tier_fee_bps(tier),
        liquidity: None,
        fee_tier: Some(tier),
        captured_at: Instant::now(),
        timestamp: Utc::now(),
    };
    Ok((Some(quote), attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VenueKind, DEFAULT_FEE_TIERS};
    use crate::types::{TradingPair, USDC, WETH};
    use crate::utils::to_raw;
    use crate::venues::provider::tests_support::MockQuoteCalls;
    use rust_decimal_macros::dec;

    fn venue() -> (VenueConfig, Address) {
        let config = crate::config::default_venues()
            .into_iter()
            .find(|v| v.id == "uniswap-v3")
            .unwrap();
        let quoter = match &config.kind {
            VenueKind::ConcentratedLiquidity { quoter, .. } => *quoter,
            _ => unreachable!(),
        };
        (config, quoter)
    }

    fn pair() -> TradingPair {
        TradingPair {
            base: WETH,
            quote: USDC,
        }
    }

    #[tokio::test]
    async fn first_viable_tier_wins_and_sets_fee() {
        let (config, quoter) = venue();
        // 0.05% tier reverts, 0.3% answers.
        let calls = MockQuoteCalls::default()
            .with_tier_failure(500)
            .with_tier_quote(3000, to_raw(dec!(2010), 6));

        let (quote, attempts) = quote_concentrated(
            &calls,
            &config,
            quoter,
            DEFAULT_FEE_TIERS,
            &pair(),
            to_raw(dec!(1), 18),
        )
        .await
        .unwrap();

        let quote = quote.expect("quote expected");
        assert_eq!(quote.fee_tier, Some(3000));
        assert_eq!(quote.fee_bps, 30);
        assert_eq!(quote.price, dec!(2010));

        assert_eq!(attempts.len(), 2);
        assert!(matches!(attempts[0].outcome, TierOutcome::Failed(_)));
        assert!(matches!(attempts[1].outcome, TierOutcome::Quoted(_)));
    }

    #[tokio::test]
    async fn all_tiers_failing_yields_none_with_attempts() {
        let (config, quoter) = venue();
        let calls = MockQuoteCalls::default()
            .with_tier_failure(500)
            .with_tier_failure(3000)
            .with_tier_failure(10000);

        let (quote, attempts) = quote_concentrated(
            &calls,
            &config,
            quoter,
            DEFAULT_FEE_TIERS,
            &pair(),
            to_raw(dec!(1), 18),
        )
        .await
        .unwrap();

        assert!(quote.is_none());
        assert_eq!(attempts.len(), 3);
    }
}
