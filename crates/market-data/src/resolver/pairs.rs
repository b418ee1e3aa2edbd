//! Currency and crypto pair vocabulary.

/// Major fiat currencies recognised in forex pairs.
pub const MAJOR_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "SEK", "NOK", "DKK", "HKD", "SGD",
    "CNY", "CNH", "MXN", "ZAR", "TRY", "PLN", "INR",
];

/// Crypto base assets the classifier knows by name.
pub const CRYPTO_BASES: &[&str] = &[
    "BTC", "XBT", "ETH", "SOL", "XRP", "ADA", "DOGE", "XDG", "DOT", "LTC", "BNB", "AVAX", "LINK",
    "MATIC", "TRX", "BCH", "UNI", "ATOM", "XLM", "SHIB",
];

/// Quote assets recognised at the end of a concatenated pair. Longest first so
/// `BTCUSDT` splits as `BTC`/`USDT` rather than `BTCUSD`/`T`.
const QUOTE_ASSETS: &[&str] = &[
    "USDT", "USDC", "BUSD", "USD", "EUR", "GBP", "JPY", "BTC", "ETH",
];

pub fn is_major_currency(code: &str) -> bool {
    MAJOR_CURRENCIES.contains(&code)
}

pub fn is_crypto_base(code: &str) -> bool {
    CRYPTO_BASES.contains(&code)
}

/// Split an uppercase pair symbol into `(base, quote)`.
///
/// Accepts `BTC/USDT`, `EUR_USD`, `BTC-USD`, bare six-letter forex pairs
/// (`EURUSD`) and concatenated crypto pairs ending in a known quote asset
/// (`BTCUSDT`, `ETHBTC`). Returns `None` for anything else.
///
/// # Examples
/// ```
/// use quotehub_market_data::resolver::split_pair;
///
/// assert_eq!(split_pair("BTCUSDT"), Some(("BTC", "USDT")));
/// assert_eq!(split_pair("EUR_USD"), Some(("EUR", "USD")));
/// assert_eq!(split_pair("AAPL"), None);
/// ```
pub fn split_pair(symbol: &str) -> Option<(&str, &str)> {
    if let Some(sep) = symbol.find(['/', '_', '-']) {
        let (base, quote) = (&symbol[..sep], &symbol[sep + 1..]);
        return (!base.is_empty() && !quote.is_empty()).then_some((base, quote));
    }

    if symbol.len() == 6 && symbol.is_ascii() {
        let (base, quote) = symbol.split_at(3);
        if is_major_currency(base) && is_major_currency(quote) {
            return Some((base, quote));
        }
    }

    QUOTE_ASSETS
        .iter()
        .find(|quote| symbol.len() > quote.len() && symbol.ends_with(*quote))
        .map(|quote| symbol.split_at(symbol.len() - quote.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_separated() {
        assert_eq!(split_pair("BTC/USD"), Some(("BTC", "USD")));
        assert_eq!(split_pair("BTC-USD"), Some(("BTC", "USD")));
        assert_eq!(split_pair("/USD"), None);
    }

    #[test]
    fn test_split_concatenated() {
        assert_eq!(split_pair("EURUSD"), Some(("EUR", "USD")));
        assert_eq!(split_pair("ETHBTC"), Some(("ETH", "BTC")));
        assert_eq!(split_pair("SOLUSDC"), Some(("SOL", "USDC")));
        assert_eq!(split_pair("USDT"), None);
    }
}
