//! Market data provider trait definitions.
//!
//! This module defines the `MarketDataProvider` trait that every registered
//! provider implements. Providers are pure: they describe requests and turn
//! raw payloads into canonical records. The HTTP round-trip, rate limiting
//! and caching happen around them in the service.

use serde_json::Value;

use crate::models::{CandleData, Interval, SymbolInfo, TickData};

use super::capabilities::ProviderDescriptor;
use super::transport::HttpRequest;

/// Provider-native parameters of one candle fetch.
#[derive(Clone, Debug)]
pub struct CandleQuery {
    /// Symbol in the provider's dialect
    pub native_symbol: String,
    /// Canonical interval requested by the caller
    pub interval: Interval,
    /// Provider interval code (declared fallback when unsupported)
    pub native_interval: &'static str,
    pub limit: u32,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    /// Wall clock at request time, in epoch milliseconds
    pub now_ms: i64,
}

impl CandleQuery {
    /// `(from, to)` in epoch seconds for providers that need both bounds.
    ///
    /// A missing `to` is now; a missing `from` reaches back `limit` buckets.
    pub fn window_secs(&self) -> (i64, i64) {
        let to = self.to_ms.unwrap_or(self.now_ms);
        let span = self.interval.duration().as_millis() as i64 * i64::from(self.limit.max(1));
        let from = self.from_ms.unwrap_or(to - span);
        (from / 1000, to / 1000)
    }
}

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source. The
/// registry uses the descriptor to decide when the provider is eligible and
/// how far apart its requests must be.
///
/// Normalizers must never panic on malformed input. Unusable payloads yield
/// an empty result (or `None`) and a warning; individual bad rows are
/// dropped.
///
/// # Example
///
/// ```ignore
/// struct MyProvider;
///
/// impl MarketDataProvider for MyProvider {
///     fn descriptor(&self) -> &'static ProviderDescriptor {
///         &MY_DESCRIPTOR
///     }
///
///     fn map_symbol(&self, symbol: &str) -> String {
///         symbol.replace('/', "")
///     }
///
///     // ... request builders and normalizers
/// }
/// ```
pub trait MarketDataProvider: Send + Sync {
    /// Static description: id, capabilities, interval table, spacing, auth.
    fn descriptor(&self) -> &'static ProviderDescriptor;

    /// Unique identifier like "BINANCE" or "ALPHA_VANTAGE".
    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    /// Rewrite a canonical symbol into the provider's dialect.
    fn map_symbol(&self, symbol: &str) -> String;

    /// Provider interval code, or the declared fallback.
    fn map_interval(&self, interval: Interval) -> &'static str {
        self.descriptor().intervals.map(interval)
    }

    fn candles_request(&self, query: &CandleQuery) -> HttpRequest;

    fn quote_request(&self, native_symbol: &str) -> HttpRequest;

    /// Search request, when the provider offers search.
    fn search_request(&self, query: &str) -> Option<HttpRequest> {
        let _ = query;
        None
    }

    /// Canonical candles tagged with `symbol` and `interval`.
    fn normalize_candles(&self, raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData>;

    /// Canonical tick, `None` when the payload holds no usable price.
    ///
    /// `now_ms` stamps the tick when the provider sends no timestamp.
    fn normalize_tick(&self, raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData>;

    fn normalize_search(&self, raw: &Value) -> Vec<SymbolInfo> {
        let _ = raw;
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_reaches_back_limit_buckets() {
        let query = CandleQuery {
            native_symbol: "AAPL".to_string(),
            interval: Interval::Hour1,
            native_interval: "60",
            limit: 24,
            from_ms: None,
            to_ms: None,
            now_ms: 1_704_153_600_000,
        };
        assert_eq!(query.window_secs(), (1_704_067_200, 1_704_153_600));
    }

    #[test]
    fn test_window_respects_explicit_bounds() {
        let query = CandleQuery {
            native_symbol: "AAPL".to_string(),
            interval: Interval::Day1,
            native_interval: "D",
            limit: 10,
            from_ms: Some(1_000_000),
            to_ms: Some(2_000_000),
            now_ms: 9_999_999_999,
        };
        assert_eq!(query.window_secs(), (1_000, 2_000));
    }
}
