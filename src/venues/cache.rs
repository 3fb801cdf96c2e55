//! Short-TTL quote cache
//!
//! Keys are a real struct, not concatenated strings, so address casing or
//! formatting differences can never collide.

use alloy::primitives::{Address, U256};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::types::Quote;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    pub venue_id: String,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct QuoteCache {
    ttl: Duration,
    entries: RwLock<HashMap<QuoteKey, Quote>>,
    stats: RwLock<CacheStats>,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Fresh cached quote for the key, if any. Expired entries count as
    /// misses and are evicted lazily on the next insert.
    pub async fn get(&self, key: &QuoteKey) -> Option<Quote> {
        let hit = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|quote| quote.is_fresh(self.ttl))
                .cloned()
        };

        let mut stats = self.stats.write().await;
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    /// Last-writer-wins insert; also drops any entries past TTL.
    pub async fn insert(&self, key: QuoteKey, quote: Quote) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, q| q.is_fresh(ttl));
        entries.insert(key, quote);
    }

    pub async fn stats(&self) -> CacheStats {
        *self.stats.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{USDC, WETH};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::time::Instant;

    fn sample_quote(venue: &str) -> Quote {
        Quote {
            venue_id: venue.to_string(),
            token_in: WETH,
            token_out: USDC,
            amount_in: U256::from(10u64).pow(U256::from(18u64)),
            amount_out: U256::from(2_000_000_000u64),
            price: dec!(2000),
            fee_bps: 30,
            liquidity: None,
            fee_tier: None,
            captured_at: Instant::now(),
            timestamp: Utc::now(),
        }
    }

    fn key_for(quote: &Quote) -> QuoteKey {
        QuoteKey {
            venue_id: quote.venue_id.clone(),
            token_in: quote.token_in.address,
            token_out: quote.token_out.address,
            amount_in: quote.amount_in,
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_returned_and_counted_as_hit() {
        let cache = QuoteCache::new(Duration::from_secs(5));
        let quote = sample_quote("uniswap-v2");
        let key = key_for(&quote);

        cache.insert(key.clone(), quote).await;
        assert!(cache.get(&key).await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = QuoteCache::new(Duration::from_millis(1));
        let quote = sample_quote("uniswap-v2");
        let key = key_for(&quote);

        cache.insert(key.clone(), quote).await;
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn distinct_amounts_do_not_collide() {
        let cache = QuoteCache::new(Duration::from_secs(5));
        let quote = sample_quote("uniswap-v2");
        let key = key_for(&quote);
        let mut other = key.clone();
        other.amount_in = key.amount_in + U256::from(1u64);

        cache.insert(key, quote).await;
        assert!(cache.get(&other).await.is_none());
    }
}
