//! OANDA v20 REST market data (practice environment).
//!
//! Candles via /v3/instruments/{instrument}/candles. OANDA has no snapshot
//! quote endpoint on the instruments API, so the latest quote is the most
//! recent 5-second candle requested with mid, bid and ask prices.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{AssetClass, CandleData, DataType, Interval, TickData};
use crate::provider::capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
use crate::provider::decode::{decimal, integer, rfc3339_millis, warn_dropped, warn_malformed};
use crate::provider::transport::HttpRequest;
use crate::provider::CandleQuery;
use crate::resolver::split_pair;

const BASE_URL: &str = "https://api-fxpractice.oanda.com/v3";
pub(crate) const PROVIDER_ID: &str = "OANDA";

pub(crate) static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    host: "api-fxpractice.oanda.com",
    asset_classes: &[AssetClass::Forex],
    data_types: &[DataType::Candles, DataType::Quote],
    intervals: IntervalTable {
        entries: &[
            (Interval::Minute1, "M1"),
            (Interval::Minute5, "M5"),
            (Interval::Minute15, "M15"),
            (Interval::Minute30, "M30"),
            (Interval::Hour1, "H1"),
            (Interval::Hour4, "H4"),
            (Interval::Day1, "D"),
            (Interval::Week1, "W"),
            (Interval::Month1, "M"),
        ],
        fallback: "H1",
    },
    min_spacing: Duration::from_millis(200),
    auth: AuthStyle::Bearer,
};

/// Rows stay raw so each one is decoded on its own.
#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OandaCandle {
    time: String,
    #[serde(default)]
    volume: Value,
    mid: Option<OandaPrice>,
    bid: Option<OandaPrice>,
    ask: Option<OandaPrice>,
}

/// Prices are decimal strings; anything else fails only that field.
#[derive(Debug, Deserialize)]
struct OandaPrice {
    #[serde(default)]
    o: Value,
    #[serde(default)]
    h: Value,
    #[serde(default)]
    l: Value,
    #[serde(default)]
    c: Value,
}

/// `EUR/USD`, `EURUSD` -> `EUR_USD`.
pub(crate) fn map_symbol(symbol: &str) -> String {
    match split_pair(symbol) {
        Some((base, quote)) => format!("{}_{}", base, quote),
        None => symbol.to_string(),
    }
}

fn rfc3339(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

pub(crate) fn candles_request(query: &CandleQuery) -> HttpRequest {
    let request = HttpRequest::get(format!("{}/instruments/{}/candles", BASE_URL, query.native_symbol))
        .query("granularity", query.native_interval)
        .query("price", "M");

    // OANDA rejects `count` together with both bounds
    match (query.from_ms, query.to_ms) {
        (Some(from), Some(to)) => request.query("from", rfc3339(from)).query("to", rfc3339(to)),
        (Some(from), None) => request.query("from", rfc3339(from)).query("count", query.limit),
        (None, Some(to)) => request.query("to", rfc3339(to)).query("count", query.limit),
        (None, None) => request.query("count", query.limit),
    }
}

pub(crate) fn quote_request(native_symbol: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/instruments/{}/candles", BASE_URL, native_symbol))
        .query("granularity", "S5")
        .query("price", "MBA")
        .query("count", 1)
}

fn parse_response(raw: &Value) -> Option<CandlesResponse> {
    if let Some(message) = raw.get("errorMessage").and_then(Value::as_str) {
        warn_malformed(PROVIDER_ID, "errorMessage", message);
        return None;
    }
    match CandlesResponse::deserialize(raw) {
        Ok(response) => Some(response),
        Err(e) => {
            warn_malformed(PROVIDER_ID, "candles", &e.to_string());
            None
        }
    }
}

pub(crate) fn normalize_candles(raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
    let Some(response) = parse_response(raw) else {
        return Vec::new();
    };

    response
        .candles
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let parsed = OandaCandle::deserialize(row)
                .ok()
                .and_then(|candle| parse_candle(&candle, symbol, interval));
            if parsed.is_none() {
                warn_dropped(PROVIDER_ID, "candles", index);
            }
            parsed
        })
        .collect()
}

fn parse_candle(candle: &OandaCandle, symbol: &str, interval: Interval) -> Option<CandleData> {
    let mid = candle.mid.as_ref()?;
    Some(CandleData {
        symbol: symbol.to_string(),
        interval,
        timestamp_ms: rfc3339_millis(&candle.time)?,
        open: decimal(&mid.o)?,
        high: decimal(&mid.h)?,
        low: decimal(&mid.l)?,
        close: decimal(&mid.c)?,
        // Tick volume
        volume: integer(&candle.volume).unwrap_or(0).max(0).into(),
        source: PROVIDER_ID.to_string(),
    })
}

pub(crate) fn normalize_tick(raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
    let response = parse_response(raw)?;
    let Some(row) = response.candles.last() else {
        warn_malformed(PROVIDER_ID, "candles", "no recent candle");
        return None;
    };
    let latest = match OandaCandle::deserialize(row) {
        Ok(latest) => latest,
        Err(e) => {
            warn_malformed(PROVIDER_ID, "candles", &e.to_string());
            return None;
        }
    };

    let close = |price: &Option<OandaPrice>| price.as_ref().and_then(|p| decimal(&p.c));
    let Some(price) = close(&latest.mid) else {
        warn_malformed(PROVIDER_ID, "mid.c", "missing or not numeric");
        return None;
    };
    let timestamp_ms = rfc3339_millis(&latest.time).unwrap_or(now_ms);

    Some(
        TickData::new(symbol, timestamp_ms, price, PROVIDER_ID)
            .with_book(close(&latest.bid), close(&latest.ask)),
    )
}
