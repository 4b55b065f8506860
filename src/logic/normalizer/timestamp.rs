//! Timestamp resolution
//!
//! Mọi nguồn log đều được quy về một kiểu instant duy nhất: `DateTime<Utc>`.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Offset-carrying layouts tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

/// Naive layouts, read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp, timezone-aware.
///
/// Strings without an offset (and bare dates) are taken as UTC.
pub fn parse_iso8601(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
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

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// osquery `calendarTime`: ISO-8601, or the daemon's own `"Mon Jan 15 10:30:00 2024 UTC"`.
pub fn parse_calendar_time(input: &str) -> Option<DateTime<Utc>> {
    if let Some(dt) = parse_iso8601(input) {
        return Some(dt);
    }

    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let body = collapsed.strip_suffix(" UTC").unwrap_or(&collapsed);
    NaiveDateTime::parse_from_str(body, "%a %b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Epoch seconds read in the local zone, returned as the same instant in UTC
pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    // keep well inside chrono's representable range
    if !secs.is_finite() || secs.abs() > 1.0e14 {
        return None;
    }

    let whole = secs.floor();
    let nanos = (((secs - whole) * 1.0e9).round() as u32).min(999_999_999);

    Local
        .timestamp_opt(whole as i64, nanos)
        .single()
        .map(|local| local.with_timezone(&Utc))
}
