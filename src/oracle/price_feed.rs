//! Aggregated reference price feed with TTL cache and fallback
//!
//! `get_price` never fails and never blocks on feed trouble: any failure
//! path lands on the static fallback table. The cache bounds external
//! query volume to one feed round-trip per symbol per TTL.

use alloy::{
    primitives::{keccak256, Address, I256, U256},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
    sol_types::{sol_data, SolType, SolValue},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    config::{ORACLE_CACHE_TTL_SECS, ORACLE_CALL_TIMEOUT_SECS, ORACLE_STALENESS_SECS},
    oracle::fallback::fallback_price,
    types::feed_for,
    utils::pow10,
    ConcreteProvider,
};

/// One feed reading, already normalized by the feed's decimals.
#[derive(Debug, Clone, Copy)]
pub struct RoundData {
    pub price: Decimal,
    /// Unix seconds of the feed's last update.
    pub updated_at: u64,
}

#[async_trait]
pub trait FeedCalls: Send + Sync {
    async fn latest_round(&self, feed: Address) -> Result<RoundData>;
}

pub struct RpcFeedCalls {
    provider: Arc<ConcreteProvider>,
}

impl RpcFeedCalls {
    pub fn new(provider: Arc<ConcreteProvider>) -> Self {
        Self { provider }
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<alloy::primitives::Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(&tx)
            .await
            .with_context(|| format!("eth_call to feed {} failed", to))
    }
}

#[async_trait]
impl FeedCalls for RpcFeedCalls {
    async fn latest_round(&self, feed: Address) -> Result<RoundData> {
        let data = keccak256("latestRoundData()")[..4].to_vec();
        let result = self.eth_call(feed, data).await?;
        let (_round_id, answer, _started_at, updated_at, _answered_in) =
            <(U256, I256, U256, U256, U256)>::abi_decode(&result, true)
                .context("Failed to decode latestRoundData")?;

        let data = keccak256("decimals()")[..4].to_vec();
        let result = self.eth_call(feed, data).await?;
        let decimals = <sol_data::Uint<8> as SolType>::abi_decode(&result, true)
            .context("Failed to decode decimals")?;

        let raw = Decimal::from_str(&answer.to_string())
            .context("Feed answer exceeds decimal range")?;
        Ok(RoundData {
            price: raw / pow10(decimals as i32),
            updated_at: updated_at.try_into().unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: Decimal,
    fetched_at: Instant,
}

pub struct PriceOracle {
    feeds: Arc<dyn FeedCalls>,
    cache: RwLock<HashMap<String, CachedPrice>>,
    ttl: Duration,
    call_timeout: Duration,
}

impl PriceOracle {
    pub fn new(feeds: Arc<dyn FeedCalls>) -> Self {
        Self {
            feeds,
            cache: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ORACLE_CACHE_TTL_SECS),
            call_timeout: Duration::from_secs(ORACLE_CALL_TIMEOUT_SECS),
        }
    }

    /// USD price for a symbol. Falls back to the static table on any
    /// feed failure; the returned value is always finite and positive
    /// for symbols the engine is configured to trade.
    pub async fn get_price(&self, symbol: &str) -> Decimal {
        match self.try_price(symbol).await {
            Some(price) => price,
            None => {
                warn!(symbol, "No feed and no fallback for symbol");
                dec!(0)
            }
        }
    }

    /// Like `get_price`, but None for symbols unknown to both the feed
    /// table and the fallback table. Callers use this to decide whether
    /// oracle validation is possible at all.
    pub async fn try_price(&self, symbol: &str) -> Option<Decimal> {
        if let Some(cached) = self.cached(symbol).await {
            return Some(cached);
        }

        match self.fetch_validated(symbol).await {
            Ok(price) => {
                self.store(symbol, price).await;
                Some(price)
            }
            Err(e) => {
                debug!(symbol, "Feed unavailable, using fallback: {e:#}");
                fallback_price(symbol)
            }
        }
    }

    /// Prices for several symbols, fetched concurrently. Each symbol
    /// falls back independently; one failure never aborts the batch.
    pub async fn get_prices(&self, symbols: &[&str]) -> HashMap<String, Decimal> {
        let fetches = symbols.iter().map(|symbol| async move {
            (symbol.to_string(), self.try_price(symbol).await)
        });

        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(symbol, price)| price.map(|p| (symbol, p)))
            .collect()
    }

    async fn cached(&self, symbol: &str) -> Option<Decimal> {
        let cache = self.cache.read().await;
        cache
            .get(symbol)
            .filter(|entry| entry.fetched_at.elapsed() <= self.ttl)
            .map(|entry| entry.price)
    }

    async fn store(&self, symbol: &str, price: Decimal) {
        let mut cache = self.cache.write().await;
        cache.insert(
            symbol.to_string(),
            CachedPrice {
                price,
                fetched_at: Instant::now(),
            },
        );
    }

    async fn fetch_validated(&self, symbol: &str) -> Result<Decimal> {
        let feed = feed_for(symbol).context("no feed configured")?;

        let round = tokio::time::timeout(self.call_timeout, self.feeds.latest_round(feed))
            .await
            .context("feed call timed out")??;

        if round.price <= dec!(0) {
            anyhow::bail!("feed returned non-positive price {}", round.price);
        }

        let now = Utc::now().timestamp().max(0) as u64;
        if now.saturating_sub(round.updated_at) > ORACLE_STALENESS_SECS {
            anyhow::bail!(
                "feed data is stale: updated {}s ago",
                now.saturating_sub(round.updated_at)
            );
        }

        Ok(round.price)
    }
}


#[cfg(test)]
mod tests {
    use super::tests_support::MockFeedCalls;
    use super::*;

    fn now_secs() -> u64 {
        Utc::now().timestamp().max(0) as u64
    }

    #[tokio::test]
    async fn live_price_wins_when_feed_is_healthy() {
        let feed = feed_for("WETH").unwrap();
        let calls = MockFeedCalls::default().with_round(feed, dec!(2600), now_secs());
        let oracle = PriceOracle::new(Arc::new(calls));

        assert_eq!(oracle.get_price("WETH").await, dec!(2600));
    }

    #[tokio::test]
    async fn feed_failure_falls_back_without_error() {
        let oracle = PriceOracle::new(Arc::new(MockFeedCalls::default().failing()));
        let price = oracle.get_price("WETH").await;
        assert_eq!(price, fallback_price("WETH").unwrap());
        assert!(price > dec!(0));
    }

    #[tokio::test]
    async fn stale_round_is_rejected_in_favor_of_fallback() {
        let feed = feed_for("WETH").unwrap();
        let stale = now_secs() - ORACLE_STALENESS_SECS - 60;
        let calls = MockFeedCalls::default().with_round(feed, dec!(2600), stale);
        let oracle = PriceOracle::new(Arc::new(calls));

        assert_eq!(
            oracle.get_price("WETH").await,
            fallback_price("WETH").unwrap()
        );
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let feed = feed_for("WETH").unwrap();
        let calls = MockFeedCalls::default().with_round(feed, dec!(0), now_secs());
        let oracle = PriceOracle::new(Arc::new(calls));

        assert_eq!(
            oracle.get_price("WETH").await,
            fallback_price("WETH").unwrap()
        );
    }

    #[tokio::test]
    async fn cache_bounds_feed_queries() {
        let feed = feed_for("WETH").unwrap();
        let calls = Arc::new(MockFeedCalls::default().with_round(feed, dec!(2600), now_secs()));
        let oracle = PriceOracle::new(calls.clone());

        oracle.get_price("WETH").await;
        oracle.get_price("WETH").await;
        oracle.get_price("WETH").await;
        assert_eq!(calls.call_count(), 1);
    }

    #[tokio::test]
    async fn batch_isolates_per_symbol_failures() {
        let feed = feed_for("WETH").unwrap();
        // Only WETH has a live round; WBTC errors and falls back, an
        // unknown symbol drops out entirely.
        let calls = MockFeedCalls::default().with_round(feed, dec!(2600), now_secs());
        let oracle = PriceOracle::new(Arc::new(calls));

        let prices = oracle.get_prices(&["WETH", "WBTC", "DOGE"]).await;
        assert_eq!(prices.get("WETH"), Some(&dec!(2600)));
        assert_eq!(prices.get("WBTC"), Some(&fallback_price("WBTC").unwrap()));
        assert!(!prices.contains_key("DOGE"));
    }

    #[tokio::test]
    async fn unknown_symbol_yields_none_not_panic() {
        let oracle = PriceOracle::new(Arc::new(MockFeedCalls::default()));
        assert!(oracle.try_price("DOGE").await.is_none());
        assert_eq!(oracle.get_price("DOGE").await, dec!(0));
    }
}
