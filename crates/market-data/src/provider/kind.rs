//! The closed set of built-in providers.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::models::{CandleData, Interval, SymbolInfo, TickData};

use super::capabilities::ProviderDescriptor;
use super::traits::{CandleQuery, MarketDataProvider};
use super::transport::HttpRequest;
use super::{alpha_vantage, binance, finnhub, kraken, oanda, yahoo};

/// One variant per provider; each dispatches to its provider module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum ProviderKind {
    Binance,
    Kraken,
    Yahoo,
    Finnhub,
    AlphaVantage,
    Oanda,
}

impl ProviderKind {
    /// Default registry order.
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Binance,
        ProviderKind::Kraken,
        ProviderKind::Yahoo,
        ProviderKind::Finnhub,
        ProviderKind::AlphaVantage,
        ProviderKind::Oanda,
    ];

    /// Look up a provider by id ("BINANCE", "ALPHA_VANTAGE", ...). Case-insensitive.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.descriptor().id.eq_ignore_ascii_case(id))
    }
}

impl From<ProviderKind> for &'static str {
    fn from(kind: ProviderKind) -> Self {
        kind.descriptor().id
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl MarketDataProvider for ProviderKind {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        match self {
            Self::Binance => &binance::DESCRIPTOR,
            Self::Kraken => &kraken::DESCRIPTOR,
            Self::Yahoo => &yahoo::DESCRIPTOR,
            Self::Finnhub => &finnhub::DESCRIPTOR,
            Self::AlphaVantage => &alpha_vantage::DESCRIPTOR,
            Self::Oanda => &oanda::DESCRIPTOR,
        }
    }

    fn map_symbol(&self, symbol: &str) -> String {
        match self {
            Self::Binance => binance::map_symbol(symbol),
            Self::Kraken => kraken::map_symbol(symbol),
            Self::Yahoo => yahoo::map_symbol(symbol),
            Self::Finnhub => finnhub::map_symbol(symbol),
            Self::AlphaVantage => alpha_vantage::map_symbol(symbol),
            Self::Oanda => oanda::map_symbol(symbol),
        }
    }

    fn candles_request(&self, query: &CandleQuery) -> HttpRequest {
        match self {
            Self::Binance => binance::candles_request(query),
            Self::Kraken => kraken::candles_request(query),
            Self::Yahoo => yahoo::candles_request(query),
            Self::Finnhub => finnhub::candles_request(query),
            Self::AlphaVantage => alpha_vantage::candles_request(query),
            Self::Oanda => oanda::candles_request(query),
        }
    }

    fn quote_request(&self, native_symbol: &str) -> HttpRequest {
        match self {
            Self::Binance => binance::quote_request(native_symbol),
            Self::Kraken => kraken::quote_request(native_symbol),
            Self::Yahoo => yahoo::quote_request(native_symbol),
            Self::Finnhub => finnhub::quote_request(native_symbol),
            Self::AlphaVantage => alpha_vantage::quote_request(native_symbol),
            Self::Oanda => oanda::quote_request(native_symbol),
        }
    }

    fn search_request(&self, query: &str) -> Option<HttpRequest> {
        match self {
            Self::Yahoo => Some(yahoo::search_request(query)),
            Self::Finnhub => Some(finnhub::search_request(query)),
            Self::AlphaVantage => Some(alpha_vantage::search_request(query)),
            Self::Binance | Self::Kraken | Self::Oanda => None,
        }
    }

    fn normalize_candles(&self, raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
        match self {
            Self::Binance => binance::normalize_candles(raw, symbol, interval),
            Self::Kraken => kraken::normalize_candles(raw, symbol, interval),
            Self::Yahoo => yahoo::normalize_candles(raw, symbol, interval),
            Self::Finnhub => finnhub::normalize_candles(raw, symbol, interval),
            Self::AlphaVantage => alpha_vantage::normalize_candles(raw, symbol, interval),
            Self::Oanda => oanda::normalize_candles(raw, symbol, interval),
        }
    }

    fn normalize_tick(&self, raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
        match self {
            Self::Binance => binance::normalize_tick(raw, symbol, now_ms),
            Self::Kraken => kraken::normalize_tick(raw, symbol, now_ms),
            Self::Yahoo => yahoo::normalize_tick(raw, symbol, now_ms),
            Self::Finnhub => finnhub::normalize_tick(raw, symbol, now_ms),
            Self::AlphaVantage => alpha_vantage::normalize_tick(raw, symbol, now_ms),
            Self::Oanda => oanda::normalize_tick(raw, symbol, now_ms),
        }
    }

    fn normalize_search(&self, raw: &Value) -> Vec<SymbolInfo> {
        match self {
            Self::Yahoo => yahoo::normalize_search(raw),
            Self::Finnhub => finnhub::normalize_search(raw),
            Self::AlphaVantage => alpha_vantage::normalize_search(raw),
            Self::Binance | Self::Kraken | Self::Oanda => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;

    #[test]
    fn test_registry_order_and_ids() {
        let ids: Vec<&str> = ProviderKind::ALL.iter().map(|p| p.id()).collect();
        assert_eq!(
            ids,
            vec!["BINANCE", "KRAKEN", "YAHOO", "FINNHUB", "ALPHA_VANTAGE", "OANDA"]
        );
    }

    #[test]
    fn test_from_id() {
        assert_eq!(ProviderKind::from_id("ALPHA_VANTAGE"), Some(ProviderKind::AlphaVantage));
        assert_eq!(ProviderKind::from_id(" oanda "), Some(ProviderKind::Oanda));
        assert_eq!(ProviderKind::from_id("POLYGON"), None);
    }

    #[test]
    fn test_keyed_providers() {
        let keyed: Vec<&str> = ProviderKind::ALL
            .iter()
            .filter(|p| p.descriptor().requires_api_key())
            .map(|p| p.id())
            .collect();
        assert_eq!(keyed, vec!["FINNHUB", "ALPHA_VANTAGE", "OANDA"]);
    }

    #[test]
    fn test_search_capability_matches_request_builder() {
        for provider in ProviderKind::ALL {
            assert_eq!(
                provider.search_request("apple").is_some(),
                provider.descriptor().supports(DataType::Search),
                "{}",
                provider
            );
        }
    }

    #[test]
    fn test_interval_mapping_per_provider() {
        assert_eq!(ProviderKind::Binance.map_interval(Interval::Hour1), "1h");
        assert_eq!(ProviderKind::AlphaVantage.map_interval(Interval::Hour1), "60min");
        assert_eq!(ProviderKind::Oanda.map_interval(Interval::Hour1), "H1");
        assert_eq!(ProviderKind::Finnhub.map_interval(Interval::Hour4), "60");
    }

    #[test]
    fn test_symbol_mapping_per_provider() {
        assert_eq!(ProviderKind::Binance.map_symbol("BTC/USD"), "BTCUSDT");
        assert_eq!(ProviderKind::Kraken.map_symbol("BTC/USD"), "XBTUSD");
        assert_eq!(ProviderKind::Yahoo.map_symbol("BTC/USD"), "BTC-USD");
        assert_eq!(ProviderKind::Oanda.map_symbol("EURUSD"), "EUR_USD");
        assert_eq!(ProviderKind::Finnhub.map_symbol("SHOP.TO"), "SHOP");
    }

    #[test]
    fn test_serializes_as_id() {
        assert_eq!(
            serde_json::to_value(ProviderKind::AlphaVantage).unwrap(),
            serde_json::json!("ALPHA_VANTAGE")
        );
    }
}
