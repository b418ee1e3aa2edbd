//! Aggregation facade.
//!
//! [`AggregationService`] is the one entry point callers use. It owns the
//! registry, the selector, the rate limiter and both caches; nothing lives
//! in globals. Each call runs:
//!
//! 1. Cache lookup
//! 2. Fallback sequence from the selector
//! 3. For each provider: asset-class gate, rate-limiter slot, HTTP fetch,
//!    normalization, validation
//! 4. On the first usable result, cache store and return
//!
//! Providers are tried strictly one after another; soft failures are logged
//! in the call's [`FetchDiagnostics`] and never reach the caller on their
//! own.

use std::borrow::Cow;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::cache::{CacheStats, MarketDataCache};
use crate::config::MarketDataConfig;
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{
    AssetClass, CandleData, CandleRequest, DataType, Interval, ProviderId, QuoteRequest,
    SymbolInfo, TickData, MAX_CANDLE_LIMIT,
};
use crate::provider::{
    CandleQuery, HttpRequest, HttpTransport, MarketDataProvider, ReqwestTransport,
};
use crate::registry::{
    CandleValidator, FetchDiagnostics, ProviderRegistry, ProviderSelector, RateLimiter,
    RegisteredProvider,
};
use crate::resolver::{canonical_symbol, classify};

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Market data aggregation service.
pub struct AggregationService {
    registry: ProviderRegistry,
    selector: ProviderSelector,
    rate_limiter: RateLimiter,
    cache: MarketDataCache,
    validator: CandleValidator,
    transport: Arc<dyn HttpTransport>,
}

impl AggregationService {
    /// Build a service that talks to providers over HTTP.
    pub fn from_config(config: &MarketDataConfig) -> Result<Self, MarketDataError> {
        let transport = Arc::new(ReqwestTransport::new(config.http_timeout())?);
        Self::with_transport(config, transport)
    }

    /// Build a service over a custom transport.
    ///
    /// Fails with `Configuration` or `UnknownProvider` before any request is
    /// made.
    pub fn with_transport(
        config: &MarketDataConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, MarketDataError> {
        let registry = ProviderRegistry::from_config(config)?;

        let rate_limiter = RateLimiter::new();
        for provider in registry.all() {
            rate_limiter.configure(provider.id(), provider.descriptor().min_spacing);
        }

        Ok(Self {
            registry,
            selector: ProviderSelector::new(config.preferences.clone()),
            rate_limiter,
            cache: MarketDataCache::new(config),
            validator: CandleValidator::new(),
            transport,
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Fail with `UnsupportedOperation` when no registered provider offers
    /// `data_type`. Never touches the network.
    pub fn ensure_supported(&self, data_type: DataType) -> Result<(), MarketDataError> {
        if self.registry.supporting(data_type).next().is_none() {
            return Err(MarketDataError::UnsupportedOperation {
                operation: data_type,
            });
        }
        Ok(())
    }

    /// Latest `limit` candles of `symbol` at `interval`.
    pub async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<CandleData>, MarketDataError> {
        self.fetch_candles(CandleRequest::new(symbol, interval, limit))
            .await
    }

    /// Candles for a full request: optional window and preferred provider.
    ///
    /// The result is sorted by timestamp, has one candle per timestamp,
    /// lies inside the window and holds at most `limit` candles.
    pub async fn fetch_candles(
        &self,
        request: CandleRequest,
    ) -> Result<Vec<CandleData>, MarketDataError> {
        let symbol = canonical_symbol(&request.symbol);
        let limit = request.limit.min(MAX_CANDLE_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = self.cache.candle_key(
            &symbol,
            request.interval,
            limit,
            request.from_ms,
            request.to_ms,
        );
        if let Some(cached) = self.cache.get_candles(&key, limit).await {
            debug!("Candle cache hit for {} {}", symbol, request.interval);
            return Ok(cached);
        }

        let sequence = self.sequence_for(
            &symbol,
            DataType::Candles,
            request.preferred_provider.as_deref(),
        )?;

        let now_ms = Utc::now().timestamp_millis();
        let candles = self
            .run_fallback(&symbol, DataType::Candles, &sequence, |provider| {
                self.attempt_candles(provider, &symbol, &request, limit, now_ms)
            })
            .await?;

        self.cache.set_candles(key, limit, candles.clone()).await;
        Ok(candles)
    }

    /// Latest quote of `symbol`.
    pub async fn get_quote(&self, symbol: &str) -> Result<TickData, MarketDataError> {
        self.fetch_quote(QuoteRequest::new(symbol)).await
    }

    pub async fn fetch_quote(&self, request: QuoteRequest) -> Result<TickData, MarketDataError> {
        let symbol = canonical_symbol(&request.symbol);

        if let Some(cached) = self.cache.get_quote(&symbol).await {
            debug!("Quote cache hit for {}", symbol);
            return Ok(cached);
        }

        let sequence = self.sequence_for(
            &symbol,
            DataType::Quote,
            request.preferred_provider.as_deref(),
        )?;

        let now_ms = Utc::now().timestamp_millis();
        let tick = self
            .run_fallback(&symbol, DataType::Quote, &sequence, |provider| {
                self.attempt_quote(provider, &symbol, now_ms)
            })
            .await?;

        self.cache.set_quote(&symbol, tick.clone()).await;
        Ok(tick)
    }

    /// Best-effort union of every search-capable provider's results.
    ///
    /// Providers are queried concurrently. Results keep registry order and
    /// are de-duplicated by symbol; failing providers are skipped.
    pub async fn search_symbols(&self, query: &str) -> Vec<SymbolInfo> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let searches = self
            .registry
            .supporting(DataType::Search)
            .map(|provider| self.search_one(provider, query));
        let batches = join_all(searches).await;

        let mut seen = HashSet::new();
        let results: Vec<SymbolInfo> = batches
            .into_iter()
            .flatten()
            .filter(|info| seen.insert(info.symbol.to_uppercase()))
            .collect();

        debug!("Search '{}' returned {} symbols", query, results.len());
        results
    }

    /// Start a task that purges stale cache entries every `every`.
    ///
    /// The task holds a weak reference and stops once the service is dropped.
    pub fn spawn_cache_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let service: Weak<Self> = Arc::downgrade(self);
        let every = every.max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(service) = service.upgrade() else {
                    debug!("Service dropped, stopping cache sweeper");
                    break;
                };
                service.cache.purge_expired().await;
            }
        })
    }

    fn sequence_for(
        &self,
        symbol: &str,
        data_type: DataType,
        preferred: Option<&str>,
    ) -> Result<Vec<&'static str>, MarketDataError> {
        let sequence = self
            .selector
            .select_sequence(&self.registry, symbol, data_type, preferred)?;
        if sequence.is_empty() {
            return Err(MarketDataError::UnsupportedOperation {
                operation: data_type,
            });
        }
        Ok(sequence)
    }

    /// Try each provider of `sequence` once, in order, until one succeeds.
    async fn run_fallback<'a, T, F, Fut>(
        &'a self,
        symbol: &str,
        data_type: DataType,
        sequence: &[&'static str],
        mut attempt: F,
    ) -> Result<T, MarketDataError>
    where
        F: FnMut(&'a RegisteredProvider) -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let asset_class = classify(symbol);
        let mut diagnostics = FetchDiagnostics::new();

        for id in sequence {
            let Some(provider) = self.registry.get(id) else {
                continue;
            };
            let provider_id: ProviderId = Cow::Borrowed(provider.id());

            if asset_class != AssetClass::Unknown
                && !provider.descriptor().supports_asset_class(asset_class)
            {
                debug!(
                    "Skipping '{}' for {} '{}': asset class not carried",
                    provider_id, data_type, symbol
                );
                diagnostics.record_skip(provider_id, format!("does not carry {}", asset_class));
                continue;
            }

            self.rate_limiter.acquire(provider.id()).await;

            match attempt(provider).await {
                Ok(value) => {
                    info!("Fetched {} for '{}' from '{}'", data_type, symbol, provider_id);
                    diagnostics.record_success(provider_id);
                    return Ok(value);
                }
                Err(e) => match e.retry_class() {
                    RetryClass::Never => {
                        info!("Terminal error from '{}': {}, not retrying", provider_id, e);
                        return Err(e);
                    }
                    RetryClass::NextProvider => {
                        warn!("Provider '{}' failed: {}, trying next provider", provider_id, e);
                        diagnostics.record_error(provider_id, &e);
                    }
                },
            }
        }

        warn!(
            "All providers failed for {} of '{}': {}",
            data_type,
            symbol,
            diagnostics.summary()
        );
        Err(MarketDataError::AllProvidersFailed {
            operation: data_type,
            symbol: symbol.to_string(),
            diagnostics,
        })
    }

    async fn attempt_candles(
        &self,
        provider: &RegisteredProvider,
        symbol: &str,
        request: &CandleRequest,
        limit: u32,
        now_ms: i64,
    ) -> Result<Vec<CandleData>, MarketDataError> {
        let kind = provider.kind();
        let query = CandleQuery {
            native_symbol: kind.map_symbol(symbol),
            interval: request.interval,
            native_interval: kind.map_interval(request.interval),
            limit,
            from_ms: request.from_ms,
            to_ms: request.to_ms,
            now_ms,
        };

        let http = self.authorized(provider, kind.candles_request(&query));
        let raw = self.transport.get_json(provider.id(), &http).await?;

        let candles = kind.normalize_candles(&raw, symbol, request.interval);
        if candles.is_empty() {
            return Err(MarketDataError::normalization(
                provider.id(),
                "no usable candles in payload",
            ));
        }

        let received = candles.len();
        let mut candles = self.validator.validate_batch(candles);
        if candles.is_empty() {
            return Err(MarketDataError::normalization(
                provider.id(),
                format!("all {} candles failed validation", received),
            ));
        }

        candles.sort_by_key(|c| c.timestamp_ms);
        candles.dedup_by_key(|c| c.timestamp_ms);
        candles.retain(|c| request.in_window(c.timestamp_ms));
        if candles.len() > limit as usize {
            candles.drain(..candles.len() - limit as usize);
        }

        if candles.is_empty() {
            return Err(MarketDataError::normalization(
                provider.id(),
                "no candles inside the requested window",
            ));
        }
        Ok(candles)
    }

    async fn attempt_quote(
        &self,
        provider: &RegisteredProvider,
        symbol: &str,
        now_ms: i64,
    ) -> Result<TickData, MarketDataError> {
        let kind = provider.kind();
        let http = self.authorized(provider, kind.quote_request(&kind.map_symbol(symbol)));
        let raw = self.transport.get_json(provider.id(), &http).await?;

        let tick = kind
            .normalize_tick(&raw, symbol, now_ms)
            .ok_or_else(|| MarketDataError::normalization(provider.id(), "no usable price in payload"))?;
        self.validator
            .validate_tick(&tick)
            .map_err(|message| MarketDataError::normalization(provider.id(), message))?;
        Ok(tick)
    }

    async fn search_one(&self, provider: &RegisteredProvider, query: &str) -> Vec<SymbolInfo> {
        let kind = provider.kind();
        let Some(request) = kind.search_request(query) else {
            return Vec::new();
        };

        self.rate_limiter.acquire(provider.id()).await;
        match self
            .transport
            .get_json(provider.id(), &self.authorized(provider, request))
            .await
        {
            Ok(raw) => kind.normalize_search(&raw),
            Err(e) => {
                debug!("Search on '{}' failed: {}", provider.id(), e);
                Vec::new()
            }
        }
    }

    fn authorized(&self, provider: &RegisteredProvider, request: HttpRequest) -> HttpRequest {
        request.authorize(provider.descriptor().auth, provider.api_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionPolicy;
    use crate::registry::AttemptOutcome;
    use crate::testing::StubTransport;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn service(config: MarketDataConfig, stub: StubTransport) -> (AggregationService, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let service = AggregationService::with_transport(&config, stub.clone()).unwrap();
        (service, stub)
    }

    fn klines() -> Value {
        // Out of order, with a duplicate and one row breaking OHLC
        json!([
            [1704070800000i64, "42050.0", "42200.0", "42000.0", "42150.0", "2.0"],
            [1704067200000i64, "42000.0", "42100.0", "41900.0", "42050.0", "3.5"],
            [1704070800000i64, "42050.0", "42200.0", "42000.0", "42150.0", "2.0"],
            [1704074400000i64, "42150.0", "42100.0", "42000.0", "42300.0", "1.0"],
            [1704078000000i64, "42150.0", "42400.0", "42100.0", "42300.0", "1.5"]
        ])
    }

    fn kraken_ohlc() -> Value {
        json!({
            "error": [],
            "result": {
                "XXBTZUSD": [
                    [1704067200, "42000.0", "42100.0", "41900.0", "42050.0", "42010.0", "3.5", 120]
                ],
                "last": 1704067200
            }
        })
    }

    #[tokio::test]
    async fn test_candles_are_sorted_valid_and_deduplicated() {
        let (service, _) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("BINANCE", klines()),
        );

        let candles = service
            .get_candles("btcusdt", Interval::Hour1, 100)
            .await
            .unwrap();

        let stamps: Vec<i64> = candles.iter().map(|c| c.timestamp_ms).collect();
        assert_eq!(stamps, vec![1704067200000, 1704070800000, 1704078000000]);
        assert!(candles.iter().all(CandleData::satisfies_ohlc));
        assert!(candles.iter().all(|c| c.symbol == "BTCUSDT" && c.source == "BINANCE"));
    }

    #[tokio::test]
    async fn test_limit_keeps_latest_candles() {
        let (service, _) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("BINANCE", klines()),
        );

        let candles = service
            .get_candles("BTCUSDT", Interval::Hour1, 2)
            .await
            .unwrap();
        let stamps: Vec<i64> = candles.iter().map(|c| c.timestamp_ms).collect();
        assert_eq!(stamps, vec![1704070800000, 1704078000000]);
    }

    #[tokio::test]
    async fn test_window_is_applied() {
        let (service, _) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("BINANCE", klines()),
        );

        let request = CandleRequest::new("BTCUSDT", Interval::Hour1, 100)
            .with_range(Some(1704070800000), Some(1704074400000));
        let candles = service.fetch_candles(request).await.unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].timestamp_ms, 1704070800000);
    }

    #[tokio::test]
    async fn test_zero_limit_skips_network() {
        let (service, stub) = service(MarketDataConfig::default(), StubTransport::new());

        let candles = service.get_candles("BTCUSDT", Interval::Day1, 0).await.unwrap();
        assert!(candles.is_empty());
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let (service, stub) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("BINANCE", klines()),
        );

        let first = service.get_candles("BTCUSDT", Interval::Hour1, 10).await.unwrap();
        let second = service.get_candles("BTCUSDT", Interval::Hour1, 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_short_history_is_cached_without_limit_in_key() {
        let config = MarketDataConfig {
            candle_key_includes_limit: false,
            ..MarketDataConfig::default()
        };
        let (service, stub) = service(
            config,
            StubTransport::new().respond(
                "BINANCE",
                json!([[1704067200000i64, "42000.0", "42100.0", "41900.0", "42050.0", "3.5"]]),
            ),
        );

        let first = service.get_candles("BTCUSDT", Interval::Hour1, 100).await.unwrap();
        let second = service.get_candles("BTCUSDT", Interval::Hour1, 100).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_refetch() {
        let (service, stub) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("BINANCE", klines()),
        );

        service.get_candles("BTCUSDT", Interval::Hour1, 10).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        service.get_candles("BTCUSDT", Interval::Hour1, 10).await.unwrap();
        assert_eq!(stub.call_count(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        service.get_candles("BTCUSDT", Interval::Hour1, 10).await.unwrap();
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fallback_uses_next_provider() {
        let (service, stub) = service(
            MarketDataConfig::default(),
            StubTransport::new()
                .fail("BINANCE", "HTTP 502")
                .respond("KRAKEN", kraken_ohlc()),
        );

        let candles = service.get_candles("BTC/USD", Interval::Hour1, 10).await.unwrap();
        assert_eq!(candles[0].source, "KRAKEN");
        assert_eq!(stub.called_providers(), vec!["BINANCE", "KRAKEN"]);
    }

    #[tokio::test]
    async fn test_empty_payload_falls_through() {
        let (service, _) = service(
            MarketDataConfig::default(),
            StubTransport::new()
                .respond("BINANCE", json!([]))
                .respond("KRAKEN", kraken_ohlc()),
        );

        let candles = service.get_candles("BTCUSDT", Interval::Hour1, 10).await.unwrap();
        assert_eq!(candles[0].source, "KRAKEN");
    }

    #[tokio::test]
    async fn test_all_failed_carries_ordered_log() {
        let (service, stub) = service(
            MarketDataConfig::default(),
            StubTransport::new()
                .fail("BINANCE", "HTTP 500")
                .respond("KRAKEN", json!({"error": ["EGeneral:Internal error"]})),
        );

        let err = service.get_quote("BTCUSDT").await.unwrap_err();
        let diagnostics = err.diagnostics().unwrap();
        assert_eq!(diagnostics.attempted(), vec!["BINANCE", "KRAKEN", "YAHOO"]);
        assert_eq!(diagnostics.attempts[0].outcome, AttemptOutcome::RequestFailed);
        assert_eq!(diagnostics.attempts[1].outcome, AttemptOutcome::NormalizationFailed);
        assert_eq!(stub.call_count(), 3);
    }

    #[tokio::test]
    async fn test_asset_class_gate_records_skip() {
        let config = MarketDataConfig::default().with_providers(["BINANCE", "YAHOO"]);
        let (service, stub) = service(config, StubTransport::new());

        let err = service.get_quote("AAPL").await.unwrap_err();
        let diagnostics = err.diagnostics().unwrap();
        assert_eq!(diagnostics.attempts[0].provider_id, "YAHOO");
        assert_eq!(diagnostics.attempts[1].provider_id, "BINANCE");
        assert_eq!(diagnostics.attempts[1].outcome, AttemptOutcome::Skipped);
        assert_eq!(stub.called_providers(), vec!["YAHOO"]);
    }

    #[tokio::test]
    async fn test_quote_from_second_provider() {
        let config = MarketDataConfig {
            preferences: SelectionPolicy {
                crypto: vec!["KRAKEN".to_string(), "BINANCE".to_string()],
                ..SelectionPolicy::default()
            },
            ..MarketDataConfig::default()
        };
        let (service, _) = service(
            config,
            StubTransport::new().fail("KRAKEN", "connection refused").respond(
                "BINANCE",
                json!({"lastPrice": "65000.5", "bidPrice": "65000.0", "askPrice": "65001.0"}),
            ),
        );

        let tick = service.get_quote("BTCUSDT").await.unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.price, dec!(65000.5));
        assert_eq!(tick.bid, Some(dec!(65000.0)));
        assert_eq!(tick.ask, Some(dec!(65001.0)));
        assert_eq!(tick.source, "BINANCE");
    }

    #[tokio::test]
    async fn test_preferred_provider_is_tried_first() {
        let (service, stub) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("KRAKEN", kraken_ohlc()),
        );

        let request = CandleRequest::new("BTCUSD", Interval::Hour1, 5).with_preferred_provider("KRAKEN");
        let candles = service.fetch_candles(request).await.unwrap();
        assert_eq!(candles[0].source, "KRAKEN");
        assert_eq!(stub.called_providers(), vec!["KRAKEN"]);
    }

    #[tokio::test]
    async fn test_unknown_preferred_provider() {
        let (service, stub) = service(MarketDataConfig::default(), StubTransport::new());

        let request = QuoteRequest::new("AAPL").with_preferred_provider("POLYGON");
        let err = service.fetch_quote(request).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UnknownProvider(_)));
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn test_missing_key_fails_at_construction() {
        let config = MarketDataConfig::default().with_providers(["OANDA"]);
        let result = AggregationService::with_transport(&config, Arc::new(StubTransport::new()));
        assert!(matches!(result, Err(MarketDataError::Configuration { .. })));
    }

    #[test]
    fn test_order_book_is_unsupported() {
        let (service, _) = service(MarketDataConfig::default(), StubTransport::new());
        assert!(matches!(
            service.ensure_supported(DataType::OrderBook),
            Err(MarketDataError::UnsupportedOperation {
                operation: DataType::OrderBook
            })
        ));
        assert!(service.ensure_supported(DataType::Candles).is_ok());
    }

    #[tokio::test]
    async fn test_keyed_provider_is_authorized() {
        let config = MarketDataConfig::default()
            .with_providers(["FINNHUB"])
            .with_api_key("FINNHUB", "secret");
        let (service, stub) = service(
            config,
            StubTransport::new().respond("FINNHUB", json!({"c": 189.5, "o": 188.0, "t": 1704067200})),
        );

        let tick = service.get_quote("AAPL").await.unwrap();
        assert_eq!(tick.price, dec!(189.5));
        let call = &stub.calls()[0];
        assert!(call
            .request
            .headers
            .contains(&("X-Finnhub-Token".to_string(), "secret".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_respect_spacing() {
        let (service, stub) = service(
            MarketDataConfig::default(),
            StubTransport::new().respond("BINANCE", json!({"lastPrice": "100.5"})),
        );

        let (a, b) = tokio::join!(service.get_quote("BTCUSDT"), service.get_quote("ETHUSDT"));
        assert!(a.is_ok() && b.is_ok());

        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        let gap = calls[1].at.saturating_duration_since(calls[0].at);
        assert!(gap >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_search_merges_and_deduplicates() {
        let config = MarketDataConfig::default()
            .with_providers(["YAHOO", "FINNHUB"])
            .with_api_key("FINNHUB", "secret");
        let (service, _) = service(
            config,
            StubTransport::new()
                .respond(
                    "YAHOO",
                    json!({"quotes": [
                        {"symbol": "AAPL", "shortname": "Apple Inc.", "quoteType": "EQUITY", "exchange": "NMS"}
                    ]}),
                )
                .respond(
                    "FINNHUB",
                    json!({"count": 2, "result": [
                        {"symbol": "AAPL", "displaySymbol": "AAPL", "description": "APPLE INC", "type": "Common Stock"},
                        {"symbol": "APLE", "displaySymbol": "APLE", "description": "APPLE HOSPITALITY REIT INC", "type": "Common Stock"}
                    ]}),
                ),
        );

        let results = service.search_symbols("apple").await;
        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "APLE"]);
        assert_eq!(results[0].source, "YAHOO");
    }

    #[tokio::test]
    async fn test_search_ignores_failing_provider() {
        let config = MarketDataConfig::default()
            .with_providers(["YAHOO", "FINNHUB"])
            .with_api_key("FINNHUB", "secret");
        let (service, _) = service(
            config,
            StubTransport::new().fail("YAHOO", "HTTP 429").respond(
                "FINNHUB",
                json!({"count": 1, "result": [
                    {"symbol": "MSFT", "displaySymbol": "MSFT", "description": "MICROSOFT CORP", "type": "Common Stock"}
                ]}),
            ),
        );

        let results = service.search_symbols("microsoft").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "FINNHUB");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_sweeper_stops_with_service() {
        let (service, _) = service(MarketDataConfig::default(), StubTransport::new());
        let service = Arc::new(service);

        let handle = service.spawn_cache_sweeper(Duration::from_secs(60));
        drop(service);
        tokio::time::advance(Duration::from_secs(61)).await;

        tokio::time::timeout(Duration::from_secs(120), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
