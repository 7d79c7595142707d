//! Timestamp parsing for imported rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Integers at or above this are taken as Unix milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a time cell into Unix seconds.
///
/// Accepts Unix seconds or milliseconds (integer or decimal), RFC 3339, and
/// naive date-times or dates, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(n) = s.parse::<i64>() {
        return Some(from_epoch_number(n));
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f.abs() < i64::MAX as f64 {
            return Some(from_epoch_number(f.trunc() as i64));
        }
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
    }
    None
}

fn from_epoch_number(n: i64) -> i64 {
    if n.abs() >= MILLIS_THRESHOLD {
        n / 1000
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_and_millis() {
        assert_eq!(parse_timestamp("1704153600"), Some(1_704_153_600));
        assert_eq!(parse_timestamp("1704153600000"), Some(1_704_153_600));
        assert_eq!(parse_timestamp("1704153600.0"), Some(1_704_153_600));
    }

    #[test]
    fn iso_forms() {
        let expected = Some(1_704_153_600);
        assert_eq!(parse_timestamp("2024-01-02"), expected);
        assert_eq!(parse_timestamp("2024-01-02 00:00:00"), expected);
        assert_eq!(parse_timestamp("2024-01-02T00:00:00"), expected);
        assert_eq!(parse_timestamp("2024-01-02T00:00:00Z"), expected);
        assert_eq!(parse_timestamp("2024-01-02T01:00:00+01:00"), expected);
        assert_eq!(parse_timestamp("2024/01/02"), expected);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
        assert_eq!(parse_timestamp("NaN"), None);
    }
}
