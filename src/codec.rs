//! String encoding for kinds the backend has no native slot for.
//!
//! Blobs are stored as `"__data__:" + base64` and timestamps as
//! `"__date__:" + ISO-8601`. On read, any string starting with one of these
//! prefixes is decoded back, which means a plain string that happens to carry
//! a prefix cannot be told apart from an encoded value. Existing stores
//! depend on this exact layout, so it is not versioned.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::value::Value;

/// Prefix marking a base64-encoded blob.
pub const DATA_PREFIX: &str = "__data__:";

/// Prefix marking an ISO-8601 timestamp.
pub const DATE_PREFIX: &str = "__date__:";

/// Encodes a blob as a prefixed base64 string.
pub fn encode_data(bytes: &[u8]) -> String {
    format!("{DATA_PREFIX}{}", encode_base64(bytes))
}

/// Standard padded base64, the payload format of blob entries.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Years an RFC 3339 timestamp can carry.
const DATE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Encodes a timestamp as a prefixed ISO-8601 string with second precision.
///
/// Returns `None` for years outside 0000-9999, which would not parse back.
pub fn encode_date(date: &DateTime<Utc>) -> Option<String> {
    DATE_YEARS
        .contains(&date.year())
        .then(|| format!("{DATE_PREFIX}{}", format_date(date)))
}

/// ISO-8601 text of a timestamp, e.g. `2024-03-01T12:30:00Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Decodes standard padded base64.
pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}

/// Parses an RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Strips a reserved prefix, if any.
pub fn strip_reserved_prefix(text: &str) -> &str {
    text.strip_prefix(DATA_PREFIX)
        .or_else(|| text.strip_prefix(DATE_PREFIX))
        .unwrap_or(text)
}

/// Decodes a stored string by prefix-sniffing.
///
/// Returns `None` when a prefixed payload does not decode; unprefixed strings
/// come back unchanged.
pub fn decode_string(text: String) -> Option<Value> {
    if let Some(payload) = text.strip_prefix(DATA_PREFIX) {
        decode_base64(payload).map(Value::Data)
    } else if let Some(payload) = text.strip_prefix(DATE_PREFIX) {
        parse_date(payload).map(Value::Date)
    } else {
        Some(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(text: &str) -> DateTime<Utc> {
        parse_date(text).unwrap()
    }

    #[test]
    fn test_encode_data_layout() {
        assert_eq!(encode_data(b"hello"), "__data__:aGVsbG8=");
        assert_eq!(encode_data(&[]), "__data__:");
    }

    #[test]
    fn test_encode_date_layout() {
        let d = date("2023-11-14T22:13:20.750+01:00");
        assert_eq!(encode_date(&d).as_deref(), Some("__date__:2023-11-14T21:13:20Z"));
    }

    #[test]
    fn test_encode_date_rejects_years_rfc3339_cannot_hold() {
        let earliest = date("0000-01-01T00:00:00Z");
        let latest = date("9999-12-31T23:59:59Z");
        let encoded = encode_date(&earliest).unwrap();
        assert_eq!(decode_string(encoded), Some(Value::Date(earliest)));
        assert!(encode_date(&latest).is_some());

        let too_late = DateTime::<Utc>::from_timestamp(253_402_300_800, 0).unwrap();
        let too_early = DateTime::<Utc>::from_timestamp(-62_167_219_201, 0).unwrap();
        assert_eq!(too_late.year(), 10000);
        assert_eq!(too_early.year(), -1);
        assert_eq!(encode_date(&too_late), None);
        assert_eq!(encode_date(&too_early), None);
    }

    #[test]
    fn test_decode_string_sniffs_prefixes() {
        assert_eq!(
            decode_string("__data__:aGVsbG8=".into()),
            Some(Value::Data(b"hello".to_vec()))
        );
        assert_eq!(decode_string("__data__:".into()), Some(Value::Data(Vec::new())));
        assert_eq!(
            decode_string("__date__:2024-03-01T12:30:00Z".into()),
            Some(Value::Date(date("2024-03-01T12:30:00Z")))
        );
        assert_eq!(
            decode_string("plain".into()),
            Some(Value::String("plain".into()))
        );
    }

    #[test]
    fn test_decode_string_rejects_bad_payloads() {
        assert_eq!(decode_string("__data__:not base64!".into()), None);
        assert_eq!(decode_string("__date__:yesterday".into()), None);
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert_eq!(
            decode_string("__DATA__:aGk=".into()),
            Some(Value::String("__DATA__:aGk=".into()))
        );
    }

    #[test]
    fn test_strip_reserved_prefix() {
        assert_eq!(strip_reserved_prefix("__data__:abc"), "abc");
        assert_eq!(strip_reserved_prefix("__date__:2024"), "2024");
        assert_eq!(strip_reserved_prefix("abc"), "abc");
    }
}
