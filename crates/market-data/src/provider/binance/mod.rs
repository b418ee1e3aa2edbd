//! Binance spot market data.
//!
//! - Candles via /api/v3/klines (array-of-arrays, prices as strings)
//! - Quotes via /api/v3/ticker/24hr
//!
//! Public endpoints, no API key. Weight limits are generous, so the spacing
//! guard is short.

use std::time::Duration;

use serde_json::Value;

use crate::models::{AssetClass, CandleData, DataType, Interval, TickData};
use crate::provider::capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
use crate::provider::decode::{decimal, integer, warn_dropped, warn_malformed};
use crate::provider::transport::HttpRequest;
use crate::provider::CandleQuery;
use crate::resolver::split_pair;

const BASE_URL: &str = "https://api.binance.com/api/v3";
pub(crate) const PROVIDER_ID: &str = "BINANCE";

pub(crate) static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    host: "api.binance.com",
    asset_classes: &[AssetClass::Crypto],
    data_types: &[DataType::Candles, DataType::Quote],
    intervals: IntervalTable {
        entries: &[
            (Interval::Minute1, "1m"),
            (Interval::Minute5, "5m"),
            (Interval::Minute15, "15m"),
            (Interval::Minute30, "30m"),
            (Interval::Hour1, "1h"),
            (Interval::Hour4, "4h"),
            (Interval::Day1, "1d"),
            (Interval::Week1, "1w"),
            (Interval::Month1, "1M"),
        ],
        fallback: "1h",
    },
    min_spacing: Duration::from_millis(100),
    auth: AuthStyle::None,
};

/// `BTC/USD` -> `BTCUSDT`, `ETH-BTC` -> `ETHBTC`. Binance lists no fiat USD
/// books, so a plain USD quote is rewritten to USDT.
pub(crate) fn map_symbol(symbol: &str) -> String {
    match split_pair(symbol) {
        Some((base, "USD")) => format!("{}USDT", base),
        Some((base, quote)) => format!("{}{}", base, quote),
        None => symbol.to_string(),
    }
}

pub(crate) fn candles_request(query: &CandleQuery) -> HttpRequest {
    let mut request = HttpRequest::get(format!("{}/klines", BASE_URL))
        .query("symbol", &query.native_symbol)
        .query("interval", query.native_interval)
        .query("limit", query.limit);
    if let Some(from) = query.from_ms {
        request = request.query("startTime", from);
    }
    if let Some(to) = query.to_ms {
        request = request.query("endTime", to);
    }
    request
}

pub(crate) fn quote_request(native_symbol: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/ticker/24hr", BASE_URL)).query("symbol", native_symbol)
}

/// Kline rows: `[openTime, open, high, low, close, volume, closeTime, ...]`.
pub(crate) fn normalize_candles(raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
    let Some(rows) = raw.as_array() else {
        warn_malformed(PROVIDER_ID, "klines", "expected an array of klines");
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let candle = parse_kline(row, symbol, interval);
            if candle.is_none() {
                warn_dropped(PROVIDER_ID, "kline", index);
            }
            candle
        })
        .collect()
}

fn parse_kline(row: &Value, symbol: &str, interval: Interval) -> Option<CandleData> {
    let fields = row.as_array().filter(|f| f.len() >= 6)?;
    Some(CandleData {
        symbol: symbol.to_string(),
        interval,
        timestamp_ms: integer(&fields[0])?,
        open: decimal(&fields[1])?,
        high: decimal(&fields[2])?,
        low: decimal(&fields[3])?,
        close: decimal(&fields[4])?,
        volume: decimal(&fields[5])?,
        source: PROVIDER_ID.to_string(),
    })
}

pub(crate) fn normalize_tick(raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
    let Some(price) = raw.get("lastPrice").and_then(decimal) else {
        warn_malformed(PROVIDER_ID, "lastPrice", "missing or not numeric");
        return None;
    };

    let timestamp_ms = raw.get("closeTime").and_then(integer).unwrap_or(now_ms);

    Some(
        TickData::new(symbol, timestamp_ms, price, PROVIDER_ID)
            .with_book(
                raw.get("bidPrice").and_then(decimal),
                raw.get("askPrice").and_then(decimal),
            )
            .with_volume(raw.get("volume").and_then(decimal)),
    )
}
