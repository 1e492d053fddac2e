//! Timestamp parsing and formatting.
//!
//! Two parsers with different tolerance live here: [`parse_lenient`] is used while normalizing
//! and accepts many layouts, [`parse_strict`] is used by the loader and accepts RFC 3339 only.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::Value;

/// Canonical timestamp layout: `YYYY-MM-DDTHH:MM:SSZ`.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%SZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Format an instant in the canonical layout.
pub fn format_canonical(ts: DateTime<Utc>) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

/// Parse a raw value as a calendar instant, tolerating common layouts.
///
/// - Integers and floats are unix epoch seconds.
/// - Strings try RFC 3339, then explicit-offset layouts, then naive date-times (taken as UTC),
///   then bare dates (midnight UTC).
///
/// Returns `None` when nothing matches.
pub fn parse_lenient(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Int64(secs) => DateTime::from_timestamp(*secs, 0),
        Value::Float64(secs) if secs.is_finite() => {
            DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
        }
        Value::Utf8(s) => parse_lenient_str(s),
        _ => None,
    }
}

fn parse_lenient_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Parse an RFC 3339 instant (the canonical layout is a subset) and convert it to UTC.
pub fn parse_strict(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn lenient_accepts_common_layouts() {
        let expected = utc(2024, 5, 1, 12, 30, 0);
        for raw in [
            "2024-05-01T12:30:00Z",
            "2024-05-01T14:30:00+02:00",
            "2024-05-01 12:30:00",
            "2024-05-01 12:30",
            "2024/05/01 12:30:00",
            "05/01/2024 12:30",
            "2024-05-01T12:30:00.000",
        ] {
            assert_eq!(
                parse_lenient(&Value::Utf8(raw.to_string())),
                Some(expected),
                "layout {raw}"
            );
        }
    }

    #[test]
    fn lenient_accepts_dates_and_epoch_seconds() {
        assert_eq!(
            parse_lenient(&Value::Utf8("2024-05-01".to_string())),
            Some(utc(2024, 5, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_lenient(&Value::Int64(1_714_566_600)),
            Some(utc(2024, 5, 1, 12, 30, 0))
        );
    }

    #[test]
    fn lenient_rejects_garbage() {
        assert_eq!(parse_lenient(&Value::Utf8("yesterday".to_string())), None);
        assert_eq!(parse_lenient(&Value::Utf8("N/A".to_string())), None);
        assert_eq!(parse_lenient(&Value::Bool(true)), None);
        assert_eq!(parse_lenient(&Value::Null), None);
    }

    #[test]
    fn canonical_format_round_trips_through_strict_parser() {
        let ts = utc(2023, 12, 31, 23, 59, 59);
        let text = format_canonical(ts);
        assert_eq!(text, "2023-12-31T23:59:59Z");
        assert_eq!(parse_strict(&text).unwrap(), ts);
    }

    #[test]
    fn strict_rejects_naive_layouts() {
        assert!(parse_strict("2024-05-01 12:30:00").is_err());
        assert!(parse_strict("").is_err());
    }
}
