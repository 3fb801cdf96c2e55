//! Venue quote provider: kind dispatch, caching, failure isolation
//!
//! Partial venue availability is the steady state. Every per-venue
//! failure, timeout included, degrades to "no quote from this venue" and
//! a debug log; nothing here aborts an enclosing scan.

use alloy::primitives::U256;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::{VenueConfig, VenueKind, QUOTE_CACHE_TTL_SECS, QUOTE_CALL_TIMEOUT_SECS},
    types::{Quote, TradingPair},
    venues::{
        cache::{CacheStats, QuoteCache, QuoteKey},
        chain::QuoteCalls,
        concentrated::quote_concentrated,
        constant_product::quote_constant_product,
    },
};

pub struct VenueQuoteProvider {
    calls: Arc<dyn QuoteCalls>,
    cache: QuoteCache,
    venues: Vec<VenueConfig>,
    call_timeout: Duration,
}

impl VenueQuoteProvider {
    pub fn new(calls: Arc<dyn QuoteCalls>, venues: Vec<VenueConfig>) -> Self {
        Self {
            calls,
            cache: QuoteCache::new(Duration::from_secs(QUOTE_CACHE_TTL_SECS)),
            venues,
            call_timeout: Duration::from_secs(QUOTE_CALL_TIMEOUT_SECS),
        }
    }

    pub fn venues(&self) -> &[VenueConfig] {
        &self.venues
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Indicative quote from one venue, or None. Repeated calls within
    /// the cache TTL are answered without touching the chain.
    pub async fn get_quote(
        &self,
        venue: &VenueConfig,
        pair: &TradingPair,
        amount_in: U256,
    ) -> Option<Quote> {
        let key = QuoteKey {
            venue_id: venue.id.clone(),
            token_in: pair.base.address,
            token_out: pair.quote.address,
            amount_in,
        };

        if let Some(cached) = self.cache.get(&key).await {
            return Some(cached);
        }

        let fetched = tokio::time::timeout(
            self.call_timeout,
            self.fetch_quote(venue, pair, amount_in),
        )
        .await;

        match fetched {
            Ok(Ok(Some(quote))) => {
                self.cache.insert(key, quote.clone()).await;
                Some(quote)
            }
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                debug!(venue = %venue.id, pair = %pair.label(), "Quote failed: {e:#}");
                None
            }
            Err(_) => {
                debug!(venue = %venue.id, pair = %pair.label(), "Quote timed out");
                None
            }
        }
    }

    async fn fetch_quote(
        &self,
        venue: &VenueConfig,
        pair: &TradingPair,
        amount_in: U256,
    ) -> anyhow::Result<Option<Quote>> {
        match &venue.kind {
            VenueKind::ConstantProduct { router, factory } => {
                quote_constant_product(
                    self.calls.as_ref(),
                    venue,
                    *router,
                    *factory,
                    pair,
                    amount_in,
                )
                .await
            }
            VenueKind::ConcentratedLiquidity {
                quoter, fee_tiers, ..
            } => {
                let (quote, _attempts) = quote_concentrated(
                    self.calls.as_ref(),
                    venue,
                    *quoter,
                    fee_tiers,
                    pair,
                    amount_in,
                )
                .await?;
                Ok(quote)
            }
            VenueKind::VaultStyle { .. } | VenueKind::GenericCallData { .. } => {
                debug!(
                    venue = %venue.id,
                    kind = venue.kind.tag(),
                    "Venue kind has no quote strategy"
                );
                Ok(None)
            }
        }
    }

    /// Quotes from every configured venue, fetched concurrently with
    /// per-call isolation. Venues that fail or time out simply drop out.
    pub async fn collect_quotes(&self, pair: &TradingPair, amount_in: U256) -> Vec<Quote> {
        let fetches = self
            .venues
            .iter()
            .map(|venue| self.get_quote(venue, pair, amount_in));

        join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
pub mod tests_support {
    use super::*;
    use alloy::primitives::{address, Address};
    use anyhow::Result;
    use async_trait::async_trait;

    /// In-memory stand-in for the RPC quote boundary.
    #[derive(Debug, Clone, Default)]
    pub struct MockQuoteCalls {
        pool_reserves: Option<(U256, U256)>,
        amount_out: Option<U256>,
        router_amounts: Vec<(Address, U256)>,
        tier_quotes: Vec<(u32, U256)>,
        tier_failures: Vec<u32>,
        fail_all: bool,
    }

    impl MockQuoteCalls {
        pub fn with_pool(mut self, reserve0: U256, reserve1: U256) -> Self {
            self.pool_reserves = Some((reserve0, reserve1));
            self
        }

        pub fn with_amount_out(mut self, amount_out: U256) -> Self {
            self.amount_out = Some(amount_out);
            self
        }

        /// Router-specific output, so different venues can disagree.
        pub fn with_router_amount_out(mut self, router: Address, amount_out: U256) -> Self {
            self.router_amounts.push((router, amount_out));
            self
        }

        pub fn with_tier_quote(mut self, tier: u32, amount_out: U256) -> Self {
            self.tier_quotes.push((tier, amount_out));
            self
        }

        pub fn with_tier_failure(mut self, tier: u32) -> Self {
            self.tier_failures.push(tier);
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail_all = true;
            self
        }
    }

    #[async_trait]
    impl QuoteCalls for MockQuoteCalls {
        async fn pair_for(
            &self,
            _factory: Address,
            _token_a: Address,
            _token_b: Address,
        ) -> Result<Option<Address>> {
            if self.fail_all {
                anyhow::bail!("rpc unavailable");
            }
            Ok(self
                .pool_reserves
                .map(|_| address!("1111111111111111111111111111111111111111")))
        }

        async fn reserves(&self, _pair: Address) -> Result<(U256, U256)> {
            if self.fail_all {
                anyhow::bail!("rpc unavailable");
            }
            self.pool_reserves
                .ok_or_else(|| anyhow::anyhow!("no pool"))
        }

        async fn amounts_out(
            &self,
            router: Address,
            amount_in: U256,
            _path: &[Address],
        ) -> Result<Vec<U256>> {
            if self.fail_all {
                anyhow::bail!("rpc unavailable");
            }
            let out = self
                .router_amounts
                .iter()
                .find(|(r, _)| *r == router)
                .map(|(_, out)| *out)
                .or(self.amount_out)
                .ok_or_else(|| anyhow::anyhow!("router reverted"))?;
            Ok(vec![amount_in, out])
        }

        async fn quote_single(
            &self,
            _quoter: Address,
            _token_in: Address,
            _token_out: Address,
            fee_tier: u32,
            _amount_in: U256,
        ) -> Result<U256> {
            if self.fail_all || self.tier_failures.contains(&fee_tier) {
                anyhow::bail!("quoter reverted for tier {fee_tier}");
            }
            Ok(self
                .tier_quotes
                .iter()
                .find(|(tier, _)| *tier == fee_tier)
                .map(|(_, out)| *out)
                .unwrap_or(U256::ZERO))
        }
    }
}
