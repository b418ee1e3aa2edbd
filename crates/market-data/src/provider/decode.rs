//! Field decoding shared by the provider normalizers.
//!
//! Providers disagree on whether prices are JSON strings or numbers; these
//! helpers accept both and never panic. Malformed input is reported through
//! structured `tracing` warnings naming the provider and the field.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

/// Parse a decimal from its textual form, accepting scientific notation.
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Decimal from a JSON string or number.
pub(crate) fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

/// Integer from a JSON number or numeric string.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Epoch milliseconds from epoch seconds, `None` when out of range.
pub(crate) fn secs_to_millis(secs: i64) -> Option<i64> {
    secs.checked_mul(1000)
}

/// Epoch milliseconds from a JSON epoch-seconds field.
pub(crate) fn epoch_secs_millis(value: &Value) -> Option<i64> {
    integer(value).and_then(secs_to_millis)
}

/// Epoch milliseconds from an RFC 3339 timestamp (`2024-01-02T10:00:00.000000000Z`).
pub(crate) fn rfc3339_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Epoch milliseconds from `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`, read as UTC.
pub(crate) fn naive_millis(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Report a payload that could not be used at all.
pub(crate) fn warn_malformed(provider: &str, field: &str, reason: &str) {
    warn!(provider, field, reason, "malformed provider payload");
}

/// Report a single row dropped from an otherwise usable batch.
pub(crate) fn warn_dropped(provider: &str, field: &str, index: usize) {
    warn!(provider, field, index, "dropping row with unparsable field");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_from_string_and_number() {
        assert_eq!(decimal(&json!("65000.5")), Some(dec!(65000.5)));
        assert_eq!(decimal(&json!(1.095)), Some(dec!(1.095)));
        assert_eq!(decimal(&json!("1e-5")), Some(dec!(0.00001)));
        assert_eq!(decimal(&json!("abc")), None);
        assert_eq!(decimal(&Value::Null), None);
    }

    #[test]
    fn test_integer() {
        assert_eq!(integer(&json!(1704067200)), Some(1704067200));
        assert_eq!(integer(&json!("42")), Some(42));
        assert_eq!(integer(&json!([1])), None);
    }

    #[test]
    fn test_epoch_seconds_overflow_is_rejected() {
        assert_eq!(epoch_secs_millis(&json!(1704067200)), Some(1_704_067_200_000));
        assert_eq!(epoch_secs_millis(&json!(1e17)), None);
        assert_eq!(secs_to_millis(i64::MAX), None);
        assert_eq!(secs_to_millis(i64::MIN / 999), None);
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(
            rfc3339_millis("2024-01-01T00:00:00.000000000Z"),
            Some(1_704_067_200_000)
        );
        assert_eq!(naive_millis("2024-01-01 00:00:00"), Some(1_704_067_200_000));
        assert_eq!(naive_millis("2024-01-01"), Some(1_704_067_200_000));
        assert_eq!(naive_millis("yesterday"), None);
    }
}
