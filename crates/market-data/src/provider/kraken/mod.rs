//! Kraken public REST market data.
//!
//! - Candles via /0/public/OHLC (interval in minutes, time in seconds)
//! - Quotes via /0/public/Ticker
//!
//! Kraken answers with `{"error": [...], "result": {<pair>: ...}}` where the
//! result key is Kraken's own pair name (`XXBTZUSD`), not the one requested.

use std::time::Duration;

use serde_json::Value;

use crate::models::{AssetClass, CandleData, DataType, Interval, TickData};
use crate::provider::capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
use crate::provider::decode::{decimal, epoch_secs_millis, warn_dropped, warn_malformed};
use crate::provider::transport::HttpRequest;
use crate::provider::CandleQuery;
use crate::resolver::split_pair;

const BASE_URL: &str = "https://api.kraken.com/0/public";
pub(crate) const PROVIDER_ID: &str = "KRAKEN";

pub(crate) static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    host: "api.kraken.com",
    asset_classes: &[AssetClass::Crypto, AssetClass::Forex],
    data_types: &[DataType::Candles, DataType::Quote],
    intervals: IntervalTable {
        entries: &[
            (Interval::Minute1, "1"),
            (Interval::Minute5, "5"),
            (Interval::Minute15, "15"),
            (Interval::Minute30, "30"),
            (Interval::Hour1, "60"),
            (Interval::Hour4, "240"),
            (Interval::Day1, "1440"),
            (Interval::Week1, "10080"),
        ],
        // No monthly bars; the widest bucket is 15 days.
        fallback: "21600",
    },
    min_spacing: Duration::from_millis(1000),
    auth: AuthStyle::None,
};

fn kraken_asset(code: &str) -> &str {
    match code {
        "BTC" => "XBT",
        "DOGE" => "XDG",
        other => other,
    }
}

/// `BTCUSDT` -> `XBTUSDT`, `BTC/USD` -> `XBTUSD`, `EUR/USD` -> `EURUSD`.
pub(crate) fn map_symbol(symbol: &str) -> String {
    match split_pair(symbol) {
        Some((base, quote)) => format!("{}{}", kraken_asset(base), kraken_asset(quote)),
        None => symbol.to_string(),
    }
}

pub(crate) fn candles_request(query: &CandleQuery) -> HttpRequest {
    let mut request = HttpRequest::get(format!("{}/OHLC", BASE_URL))
        .query("pair", &query.native_symbol)
        .query("interval", query.native_interval);
    if let Some(from) = query.from_ms {
        request = request.query("since", from / 1000);
    }
    request
}

pub(crate) fn quote_request(native_symbol: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/Ticker", BASE_URL)).query("pair", native_symbol)
}

/// Returns the first pair entry of `result` whose value satisfies `accept`.
fn pair_entry<'a>(raw: &'a Value, accept: fn(&Value) -> bool) -> Option<&'a Value> {
    if let Some(errors) = raw.get("error").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            warn_malformed(PROVIDER_ID, "error", &joined);
            return None;
        }
    }

    let entry = raw
        .get("result")
        .and_then(Value::as_object)
        .and_then(|result| {
            result
                .iter()
                .filter(|(key, _)| key.as_str() != "last")
                .map(|(_, value)| value)
                .find(|value| accept(value))
        });

    if entry.is_none() {
        warn_malformed(PROVIDER_ID, "result", "no pair entry in result");
    }
    entry
}

/// OHLC rows: `[time, open, high, low, close, vwap, volume, count]`.
pub(crate) fn normalize_candles(raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
    let Some(rows) = pair_entry(raw, Value::is_array).and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let candle = parse_ohlc(row, symbol, interval);
            if candle.is_none() {
                warn_dropped(PROVIDER_ID, "ohlc", index);
            }
            candle
        })
        .collect()
}

fn parse_ohlc(row: &Value, symbol: &str, interval: Interval) -> Option<CandleData> {
    let fields = row.as_array().filter(|f| f.len() >= 7)?;
    Some(CandleData {
        symbol: symbol.to_string(),
        interval,
        timestamp_ms: epoch_secs_millis(&fields[0])?,
        open: decimal(&fields[1])?,
        high: decimal(&fields[2])?,
        low: decimal(&fields[3])?,
        close: decimal(&fields[4])?,
        volume: decimal(&fields[6])?,
        source: PROVIDER_ID.to_string(),
    })
}

/// Ticker arrays: `c` = [last, lot], `b`/`a` = [price, whole lot, lot], `v` = [today, 24h].
pub(crate) fn normalize_tick(raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
    let ticker = pair_entry(raw, Value::is_object)?;
    let first = |field: &str, index: usize| ticker.get(field).and_then(|v| v.get(index)).and_then(decimal);

    let Some(price) = first("c", 0) else {
        warn_malformed(PROVIDER_ID, "c", "missing last trade price");
        return None;
    };

    Some(
        TickData::new(symbol, now_ms, price, PROVIDER_ID)
            .with_book(first("b", 0), first("a", 0))
            .with_volume(first("v", 1)),
    )
}
