//! Exchange suffixes carried by equity tickers (`SHOP.TO`, `VOD.L`).
//!
//! Generalist aggregators that key equities by bare ticker need the suffix
//! removed; providers that understand it keep the symbol unchanged.

/// Known exchange suffixes with the MIC they denote.
const EXCHANGE_SUFFIXES: &[(&str, &str)] = &[
    // North America
    ("TO", "XTSE"),
    ("V", "XTSX"),
    ("CN", "XCNQ"),
    ("NE", "XCNQ"),
    ("MX", "XMEX"),
    ("US", "XNAS"),
    // UK & Ireland
    ("L", "XLON"),
    ("IL", "XLON"),
    ("IR", "XDUB"),
    // Germany
    ("DE", "XETR"),
    ("F", "XFRA"),
    ("SG", "XSTU"),
    ("BE", "XBER"),
    // Euronext
    ("PA", "XPAR"),
    ("AS", "XAMS"),
    ("BR", "XBRU"),
    ("LS", "XLIS"),
    // Southern Europe
    ("MI", "XMIL"),
    ("MC", "XMAD"),
    // Nordic
    ("ST", "XSTO"),
    ("HE", "XHEL"),
    ("CO", "XCSE"),
    ("OL", "XOSL"),
    // Central Europe
    ("SW", "XSWX"),
    ("VI", "XWBO"),
    ("WA", "XWAR"),
    // Asia
    ("SS", "XSHG"),
    ("SZ", "XSHE"),
    ("HK", "XHKG"),
    ("T", "XTKS"),
    ("KS", "XKRX"),
    ("KQ", "XKOS"),
    ("SI", "XSES"),
    ("BO", "XBOM"),
    ("NS", "XNSE"),
    ("TW", "XTAI"),
    // Oceania
    ("AX", "XASX"),
    ("NZ", "XNZE"),
    // South America
    ("SA", "BVMF"),
    // Africa
    ("JO", "XJSE"),
];

/// Map an exchange suffix (without the dot) to its MIC.
///
/// # Examples
/// ```
/// use quotehub_market_data::resolver::suffix_to_mic;
///
/// assert_eq!(suffix_to_mic("TO"), Some("XTSE"));
/// assert_eq!(suffix_to_mic("l"), Some("XLON"));
/// assert_eq!(suffix_to_mic("B"), None);
/// ```
pub fn suffix_to_mic(suffix: &str) -> Option<&'static str> {
    let suffix = suffix.to_ascii_uppercase();
    EXCHANGE_SUFFIXES
        .iter()
        .find(|(known, _)| *known == suffix)
        .map(|(_, mic)| *mic)
}

/// Split `TICKER.SUFFIX` into its parts when the suffix is a known exchange.
///
/// Share classes such as `BRK.B` are not exchange suffixes and stay intact.
pub fn split_exchange_suffix(symbol: &str) -> (&str, Option<&str>) {
    match symbol.rsplit_once('.') {
        Some((ticker, suffix)) if !ticker.is_empty() && suffix_to_mic(suffix).is_some() => {
            (ticker, Some(suffix))
        }
        _ => (symbol, None),
    }
}

/// Remove a known exchange suffix, leaving other symbols untouched.
pub fn strip_exchange_suffix(symbol: &str) -> &str {
    split_exchange_suffix(symbol).0
}
