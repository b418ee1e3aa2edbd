use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::interval::Interval;
use super::types::ProviderId;

/// Upper bound on candles returned by one request.
pub const MAX_CANDLE_LIMIT: u32 = 1000;

/// One OHLCV bar.
///
/// `timestamp_ms` is the bucket open time in epoch milliseconds. Values are
/// produced once per successful fetch and never mutated afterwards; the
/// validator guarantees `high >= max(open, close)`, `low <= min(open, close)`
/// and `volume >= 0` for everything the service returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleData {
    pub symbol: String,
    pub interval: Interval,
    pub timestamp_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// Provider id that produced the bar (BINANCE, YAHOO, ...)
    pub source: String,
}

impl CandleData {
    pub fn satisfies_ohlc(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

/// Parameters of a candle range request.
#[derive(Clone, Debug)]
pub struct CandleRequest {
    pub symbol: String,
    pub interval: Interval,
    pub limit: u32,
    /// Inclusive lower bound on `timestamp_ms`
    pub from_ms: Option<i64>,
    /// Inclusive upper bound on `timestamp_ms`
    pub to_ms: Option<i64>,
    pub preferred_provider: Option<ProviderId>,
}

impl CandleRequest {
    pub fn new(symbol: impl Into<String>, interval: Interval, limit: u32) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            limit: limit.min(MAX_CANDLE_LIMIT),
            from_ms: None,
            to_ms: None,
            preferred_provider: None,
        }
    }

    pub fn with_range(mut self, from_ms: Option<i64>, to_ms: Option<i64>) -> Self {
        self.from_ms = from_ms;
        self.to_ms = to_ms;
        self
    }

    pub fn with_preferred_provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }

    pub fn in_window(&self, timestamp_ms: i64) -> bool {
        self.from_ms.map_or(true, |from| timestamp_ms >= from)
            && self.to_ms.map_or(true, |to| timestamp_ms <= to)
    }
}
