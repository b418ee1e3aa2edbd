//! Quote and candle caches.
//!
//! Two independent TTL stores owned by one service instance:
//! - quotes keyed by canonical symbol (short TTL)
//! - candle ranges keyed by symbol, interval, window and optionally limit
//!   (longer TTL)

mod ttl_store;

pub use ttl_store::{CacheEntry, TtlStore};

use log::debug;

use crate::config::MarketDataConfig;
use crate::models::{CandleData, Interval, TickData};

/// Key of a cached candle range.
///
/// `limit` is `None` when the cache is configured to ignore it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CandleCacheKey {
    pub symbol: String,
    pub interval: Interval,
    pub limit: Option<u32>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

/// A cached candle range and the `limit` it was fetched with.
///
/// A provider may return fewer candles than requested; the range still
/// answers any request up to `request_limit`.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedRange {
    pub request_limit: u32,
    pub candles: Vec<CandleData>,
}

/// Entry counts per store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub quotes: u64,
    pub candles: u64,
}

pub struct MarketDataCache {
    quotes: TtlStore<String, TickData>,
    candles: TtlStore<CandleCacheKey, CachedRange>,
    key_includes_limit: bool,
}

impl MarketDataCache {
    pub fn new(config: &MarketDataConfig) -> Self {
        Self {
            quotes: TtlStore::new(config.quote_ttl(), config.cache_capacity),
            candles: TtlStore::new(config.candle_ttl(), config.cache_capacity),
            key_includes_limit: config.candle_key_includes_limit,
        }
    }

    pub fn candle_key(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> CandleCacheKey {
        CandleCacheKey {
            symbol: symbol.to_string(),
            interval,
            limit: self.key_includes_limit.then_some(limit),
            from_ms,
            to_ms,
        }
    }

    pub async fn get_quote(&self, symbol: &str) -> Option<TickData> {
        self.quotes.get(&symbol.to_string()).await
    }

    pub async fn set_quote(&self, symbol: &str, tick: TickData) {
        self.quotes.set(symbol.to_string(), tick).await;
    }

    /// Cached candles for `key`, truncated to the last `limit` entries.
    ///
    /// When the key ignores `limit`, a range fetched with a smaller limit is
    /// a miss.
    pub async fn get_candles(&self, key: &CandleCacheKey, limit: u32) -> Option<Vec<CandleData>> {
        let CachedRange {
            request_limit,
            mut candles,
        } = self.candles.get(key).await?;

        if key.limit.is_none() {
            if request_limit < limit {
                debug!(
                    "Cached range for {} {} was fetched with limit {}, {} requested",
                    key.symbol, key.interval, request_limit, limit
                );
                return None;
            }
            let limit = limit as usize;
            if candles.len() > limit {
                candles.drain(..candles.len() - limit);
            }
        }

        Some(candles)
    }

    pub async fn set_candles(&self, key: CandleCacheKey, request_limit: u32, candles: Vec<CandleData>) {
        let range = CachedRange {
            request_limit,
            candles,
        };
        self.candles.set(key, range).await;
    }

    /// Purge stale entries from both stores.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.quotes.purge_expired().await + self.candles.purge_expired().await;
        if purged > 0 {
            debug!("Cache sweep removed {} stale entries", purged);
        }
        purged
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            quotes: self.quotes.entry_count(),
            candles: self.candles.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rust_decimal_macros::dec;

    fn candles(count: i64) -> Vec<CandleData> {
        (0..count)
            .map(|i| CandleData {
                symbol: "BTCUSDT".to_string(),
                interval: Interval::Hour1,
                timestamp_ms: i * 3_600_000,
                open: dec!(100),
                high: dec!(110),
                low: dec!(90),
                close: dec!(105),
                volume: dec!(1),
                source: "BINANCE".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_limit_is_part_of_key_by_default() {
        let cache = MarketDataCache::new(&MarketDataConfig::default());
        let key = cache.candle_key("BTCUSDT", Interval::Hour1, 10, None, None);
        cache.set_candles(key.clone(), 10, candles(10)).await;

        assert_eq!(cache.get_candles(&key, 10).await.map(|c| c.len()), Some(10));
        let other = cache.candle_key("BTCUSDT", Interval::Hour1, 5, None, None);
        assert!(cache.get_candles(&other, 5).await.is_none());
    }

    #[tokio::test]
    async fn test_limit_insensitive_keys() {
        let config = MarketDataConfig {
            candle_key_includes_limit: false,
            ..MarketDataConfig::default()
        };
        let cache = MarketDataCache::new(&config);
        let key = cache.candle_key("BTCUSDT", Interval::Hour1, 10, None, None);
        cache.set_candles(key, 10, candles(10)).await;

        let smaller = cache.candle_key("BTCUSDT", Interval::Hour1, 4, None, None);
        let hit = cache.get_candles(&smaller, 4).await.unwrap();
        assert_eq!(hit.len(), 4);
        assert_eq!(hit[0].timestamp_ms, 6 * 3_600_000);

        let larger = cache.candle_key("BTCUSDT", Interval::Hour1, 20, None, None);
        assert!(cache.get_candles(&larger, 20).await.is_none());
    }

    #[tokio::test]
    async fn test_short_range_serves_its_own_limit() {
        let config = MarketDataConfig {
            candle_key_includes_limit: false,
            ..MarketDataConfig::default()
        };
        let cache = MarketDataCache::new(&config);
        let key = cache.candle_key("BTCUSDT", Interval::Hour1, 100, None, None);
        cache.set_candles(key.clone(), 100, candles(3)).await;

        assert_eq!(cache.get_candles(&key, 100).await.map(|c| c.len()), Some(3));
        assert_eq!(cache.get_candles(&key, 2).await.map(|c| c.len()), Some(2));
        assert!(cache.get_candles(&key, 101).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_ttl() {
        let cache = MarketDataCache::new(&MarketDataConfig::default());
        cache
            .set_quote("AAPL", TickData::new("AAPL", 0, dec!(150), "YAHOO"))
            .await;

        tokio::time::advance(Duration::from_secs(14)).await;
        assert!(cache.get_quote("AAPL").await.is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_quote("AAPL").await.is_none());
    }
}
