//! Finnhub market data provider.
//!
//! This module provides market data from the Finnhub API:
//! - Equity candles via /stock/candle
//! - Latest quotes via /quote
//! - Symbol search via /search
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{AssetClass, CandleData, DataType, Interval, SymbolInfo, TickData};
use crate::provider::capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
use crate::provider::decode::{
    decimal, epoch_secs_millis, secs_to_millis, warn_dropped, warn_malformed,
};
use crate::provider::transport::HttpRequest;
use crate::provider::CandleQuery;
use crate::resolver::strip_exchange_suffix;

const BASE_URL: &str = "https://finnhub.io/api/v1";
pub(crate) const PROVIDER_ID: &str = "FINNHUB";

pub(crate) static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    host: "finnhub.io",
    asset_classes: &[AssetClass::Stock],
    data_types: &[DataType::Candles, DataType::Quote, DataType::Search],
    intervals: IntervalTable {
        entries: &[
            (Interval::Minute1, "1"),
            (Interval::Minute5, "5"),
            (Interval::Minute15, "15"),
            (Interval::Minute30, "30"),
            (Interval::Hour1, "60"),
            (Interval::Day1, "D"),
            (Interval::Week1, "W"),
            (Interval::Month1, "M"),
        ],
        fallback: "60",
    },
    min_spacing: Duration::from_millis(1000),
    auth: AuthStyle::Header("X-Finnhub-Token"),
};

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
    // Note: h, l, d (change), dp (percent change), pc (previous close) exist but not used
}

/// Response from /stock/candle endpoint
///
/// Columns are kept as raw values so one bad cell only drops its row.
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    #[serde(default)]
    c: Vec<Value>,
    #[serde(default)]
    h: Vec<Value>,
    #[serde(default)]
    l: Vec<Value>,
    #[serde(default)]
    o: Vec<Value>,
    #[serde(default)]
    v: Vec<Value>,
    /// Timestamps (Unix)
    #[serde(default)]
    t: Vec<Value>,
}

/// Response from /search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    /// Full description/name
    description: String,
    /// Display symbol
    display_symbol: String,
    /// Security type (e.g., "Common Stock", "ETF")
    #[serde(rename = "type")]
    security_type: String,
}

// ============================================================================
// Requests
// ============================================================================

/// Finnhub lists US equities without a suffix.
pub(crate) fn map_symbol(symbol: &str) -> String {
    strip_exchange_suffix(symbol).to_string()
}

pub(crate) fn candles_request(query: &CandleQuery) -> HttpRequest {
    let (from, to) = query.window_secs();
    HttpRequest::get(format!("{}/stock/candle", BASE_URL))
        .query("symbol", &query.native_symbol)
        .query("resolution", query.native_interval)
        .query("from", from)
        .query("to", to)
}

pub(crate) fn quote_request(native_symbol: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/quote", BASE_URL)).query("symbol", native_symbol)
}

pub(crate) fn search_request(query: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/search", BASE_URL)).query("q", query)
}

// ============================================================================
// Normalization
// ============================================================================

pub(crate) fn normalize_candles(raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
    let response = match CandleResponse::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            warn_malformed(PROVIDER_ID, "stock/candle", &e.to_string());
            return Vec::new();
        }
    };

    if response.s != "ok" {
        warn_malformed(PROVIDER_ID, "s", &format!("status '{}'", response.s));
        return Vec::new();
    }

    let len = response.t.len();
    if response.c.len() != len || response.o.len() != len || response.h.len() != len || response.l.len() != len {
        warn_malformed(PROVIDER_ID, "c/o/h/l/t", "array length mismatch");
        return Vec::new();
    }

    let mut candles = Vec::with_capacity(len);
    for i in 0..len {
        let column = |values: &[Value]| values.get(i).and_then(decimal);
        let row = (
            epoch_secs_millis(&response.t[i]),
            column(&response.o),
            column(&response.h),
            column(&response.l),
            column(&response.c),
        );
        let (Some(timestamp_ms), Some(open), Some(high), Some(low), Some(close)) = row else {
            warn_dropped(PROVIDER_ID, "stock/candle", i);
            continue;
        };

        candles.push(CandleData {
            symbol: symbol.to_string(),
            interval,
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume: column(&response.v).unwrap_or(Decimal::ZERO),
            source: PROVIDER_ID.to_string(),
        });
    }

    candles
}

pub(crate) fn normalize_tick(raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
    let response = match QuoteResponse::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            warn_malformed(PROVIDER_ID, "quote", &e.to_string());
            return None;
        }
    };

    let Some(close) = response.c else {
        warn_malformed(PROVIDER_ID, "c", "missing current price");
        return None;
    };

    // Finnhub returns zeros for unknown symbols instead of an error
    if close == 0.0 && response.o.unwrap_or(0.0) == 0.0 {
        warn_malformed(PROVIDER_ID, "c", "zero price, symbol unknown or not trading");
        return None;
    }

    let price = Decimal::try_from(close).ok()?;
    let timestamp_ms = match response.t.filter(|t| *t > 0) {
        Some(secs) => {
            let Some(ms) = secs_to_millis(secs) else {
                warn_malformed(PROVIDER_ID, "t", "out of range");
                return None;
            };
            ms
        }
        None => now_ms,
    };

    Some(TickData::new(symbol, timestamp_ms, price, PROVIDER_ID))
}

pub(crate) fn normalize_search(raw: &Value) -> Vec<SymbolInfo> {
    let response = match SearchResponse::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            warn_malformed(PROVIDER_ID, "result", &e.to_string());
            return Vec::new();
        }
    };

    response
        .result
        .into_iter()
        .filter(|item| !item.display_symbol.is_empty())
        .map(|item| {
            let asset_type = match item.security_type.as_str() {
                "Common Stock" => "Stock".to_string(),
                "" => "Unknown".to_string(),
                other => other.to_string(),
            };
            SymbolInfo::new(item.display_symbol, item.description, asset_type, PROVIDER_ID)
        })
        .collect()
}
