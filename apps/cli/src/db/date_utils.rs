//! Timestamp encoding for SQLite text columns.

use chrono::{DateTime, SecondsFormat, Utc};

/// Encode a timestamp as RFC 3339 in UTC with fixed microsecond precision.
///
/// The fixed width keeps lexical order equal to chronological order, so
/// `ORDER BY` and `<=` on the text column compare times.
pub fn to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a timestamp written by [`to_sql`] (any RFC 3339 offset is accepted).
pub fn from_sql(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_fixed_width_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(to_sql(ts), "2024-01-02T03:04:05.000000Z");
        assert_eq!(from_sql(&to_sql(ts)), Some(ts));
    }

    #[test]
    fn test_lexical_order_is_chronological() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let late = early + Duration::milliseconds(1);
        assert!(to_sql(early) < to_sql(late));
    }

    #[test]
    fn test_longest_interval_round_trips() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let far = now + Duration::days(36500);
        assert_eq!(from_sql(&to_sql(far)), Some(far));
        assert!(to_sql(now) < to_sql(far));
    }

    #[test]
    fn test_from_sql_converts_offsets() {
        let parsed = from_sql("2024-01-02T05:04:05+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(from_sql("yesterday"), None);
    }
}
