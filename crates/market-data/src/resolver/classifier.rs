//! Asset-class classification of raw symbols.
//!
//! Rules are evaluated in order: crypto, forex, stock. The first match wins.

use crate::models::AssetClass;

use super::exchange_suffixes::split_exchange_suffix;
use super::pairs::{is_crypto_base, is_major_currency, split_pair};

const CRYPTO_QUOTE_SUFFIXES: &[&str] = &["USDT", "BTC", "ETH"];

/// Normalize a caller-supplied symbol to its canonical (trimmed, uppercase) form.
pub fn canonical_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Classify a symbol into an [`AssetClass`].
///
/// # Examples
/// ```
/// use quotehub_market_data::{classify, AssetClass};
///
/// assert_eq!(classify("BTCUSDT"), AssetClass::Crypto);
/// assert_eq!(classify("EUR/USD"), AssetClass::Forex);
/// assert_eq!(classify("EURUSD"), AssetClass::Forex);
/// assert_eq!(classify("AAPL"), AssetClass::Stock);
/// ```
pub fn classify(symbol: &str) -> AssetClass {
    let symbol = canonical_symbol(symbol);
    if symbol.is_empty() {
        AssetClass::Unknown
    } else if is_crypto(&symbol) {
        AssetClass::Crypto
    } else if is_forex(&symbol) {
        AssetClass::Forex
    } else if is_stock(&symbol) {
        AssetClass::Stock
    } else {
        AssetClass::Unknown
    }
}

fn is_crypto(symbol: &str) -> bool {
    if CRYPTO_QUOTE_SUFFIXES
        .iter()
        .any(|suffix| symbol.len() > suffix.len() && symbol.ends_with(suffix))
    {
        return true;
    }

    // BTC/USD, BTC-USD, and concatenated pairs such as SOLUSD
    match split_pair(symbol) {
        Some((base, quote)) => quote.starts_with("USD") && is_crypto_base(base),
        None => false,
    }
}

fn is_forex(symbol: &str) -> bool {
    let bytes = symbol.as_bytes();
    let alpha = |s: &[u8]| s.iter().all(u8::is_ascii_uppercase);

    match bytes.len() {
        7 if matches!(bytes[3], b'/' | b'_') => alpha(&bytes[..3]) && alpha(&bytes[4..]),
        6 if alpha(bytes) => is_major_currency(&symbol[..3]) || is_major_currency(&symbol[3..]),
        _ => false,
    }
}

fn is_stock(symbol: &str) -> bool {
    let plain_ticker =
        |s: &str| (1..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_uppercase());

    if plain_ticker(symbol) {
        return true;
    }

    match split_exchange_suffix(symbol) {
        (ticker, Some(_)) => {
            (1..=6).contains(&ticker.len())
                && ticker.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        }
        _ => false,
    }
}
