//! Quotehub Market Data Crate
//!
//! This crate aggregates candles and quotes from several third-party market
//! data providers behind one canonical interface.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Asset classes: crypto, forex, equities
//! - Providers: Binance, Kraken, Yahoo Finance, Finnhub, Alpha Vantage, OANDA
//! - Symbol and interval translation into each provider's dialect
//! - Ordered fallback with a per-call attempt log
//! - Per-provider request spacing and TTL caching
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |     Caller       | --> | AggregationService|  (cache check)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Selector      |  (fallback sequence)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   Rate Limiter   |  (per-provider spacing)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Provider      |  (request + normalize)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | Candles / Ticks  |  (canonical data)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`AggregationService`] - The facade; owns caches and limiter state
//! - [`CandleData`] - One OHLCV bar
//! - [`TickData`] - Latest price snapshot
//! - [`SymbolInfo`] - Search hit
//! - [`ProviderKind`] - The built-in providers
//! - [`MarketDataError`] - Error taxonomy with retry classification
//!
//! # Example
//!
//! ```no_run
//! use quotehub_market_data::{AggregationService, Interval, MarketDataConfig};
//!
//! # async fn run() -> Result<(), quotehub_market_data::MarketDataError> {
//! let service = AggregationService::from_config(&MarketDataConfig::default())?;
//! let candles = service.get_candles("BTCUSDT", Interval::Hour1, 24).await?;
//! let quote = service.get_quote("EUR/USD").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;
mod service;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export all public types from models
pub use models::{
    AssetClass, CandleData, CandleRequest, DataType, Interval, ProviderId, QuoteRequest,
    SymbolInfo, TickData, MAX_CANDLE_LIMIT,
};

pub use config::{MarketDataConfig, SelectionPolicy};
pub use errors::{MarketDataError, RetryClass};
pub use provider::{MarketDataProvider, ProviderDescriptor, ProviderKind};
pub use registry::{AttemptOutcome, FetchDiagnostics, ProviderAttempt};
pub use resolver::{canonical_symbol, classify};
pub use service::AggregationService;
