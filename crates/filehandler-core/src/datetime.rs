//! Canonical text form for temporal values.
//!
//! JSON has no temporal type, so datetimes travel as ISO-8601 strings:
//! `YYYY-MM-DDTHH:MM:SS`, followed by `.ffffff` when there are sub-second
//! digits and by `+HH:MM` when the value carries an offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A parsed datetime, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDateTime {
    /// Wall-clock datetime without offset
    Naive(NaiveDateTime),
    /// Datetime with a fixed UTC offset
    Offset(DateTime<FixedOffset>),
}

/// Parse a full ISO-8601 datetime string.
///
/// Date-only strings (`2024-01-01`) and anything else that is not a complete
/// datetime return `None`, so ordinary text is never turned into a date.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<ParsedDateTime> {
    // Cheap reject before trying every format: "YYYY-MM-DD?HH:MM" minimum.
    let bytes = s.as_bytes();
    if bytes.len() < 16 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    if !matches!(bytes[10], b'T' | b't' | b' ') {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ParsedDateTime::Offset(dt));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(ParsedDateTime::Naive)
}

/// Format a naive datetime in canonical form.
#[must_use]
pub fn format_naive(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Format an offset datetime in canonical form.
#[must_use]
pub fn format_offset(dt: &DateTime<FixedOffset>) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_naive() {
        assert_eq!(
            parse_datetime("2024-01-01T12:00:00"),
            Some(ParsedDateTime::Naive(naive(2024, 1, 1, 12, 0, 0)))
        );
        assert_eq!(
            parse_datetime("2024-01-01 12:30"),
            Some(ParsedDateTime::Naive(naive(2024, 1, 1, 12, 30, 0)))
        );
    }

    #[test]
    fn test_parse_offset() {
        let parsed = parse_datetime("2024-06-30T08:15:00+02:00").unwrap();
        match parsed {
            ParsedDateTime::Offset(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), 7200);
                assert_eq!(format_offset(&dt), "2024-06-30T08:15:00+02:00");
            }
            ParsedDateTime::Naive(_) => panic!("expected offset datetime"),
        }
    }

    #[test]
    fn test_plain_strings_are_not_datetimes() {
        for s in ["", "Test", "2024-01-01", "2024-13-01T00:00:00", "12:00:00", "2024-01-01Tnoon"] {
            assert_eq!(parse_datetime(s), None, "{s:?}");
        }
    }

    #[test]
    fn test_format_drops_zero_fraction() {
        assert_eq!(format_naive(&naive(2024, 1, 1, 12, 0, 0)), "2024-01-01T12:00:00");
        let with_micros = naive(2024, 1, 1, 12, 0, 0)
            .with_nanosecond(123_456_000)
            .unwrap();
        assert_eq!(format_naive(&with_micros), "2024-01-01T12:00:00.123456");
    }

    proptest! {
        #[test]
        fn prop_naive_round_trip(
            secs in 0i64..4_102_444_800,
            micros in 0u32..1_000_000,
        ) {
            let dt = DateTime::from_timestamp(secs, micros * 1000).unwrap().naive_utc();
            let text = format_naive(&dt);
            prop_assert_eq!(parse_datetime(&text), Some(ParsedDateTime::Naive(dt)));
        }

        #[test]
        fn prop_offset_round_trip(
            secs in 0i64..4_102_444_800,
            offset_minutes in -720i32..=840,
        ) {
            let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
            let dt = DateTime::from_timestamp(secs, 0).unwrap().with_timezone(&offset);
            let text = format_offset(&dt);
            prop_assert_eq!(parse_datetime(&text), Some(ParsedDateTime::Offset(dt)));
        }
    }
}
