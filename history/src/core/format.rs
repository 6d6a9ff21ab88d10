//! Timestamp conversions between epoch milliseconds and display strings.

use time::{format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime};

pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_epoch_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

/// RFC 3339 rendering, e.g. `2025-03-01T12:00:00Z`.
pub fn format_rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| "—".to_string())
}

/// RFC 3339 rendering of an epoch-millisecond timestamp; empty when the
/// value falls outside the representable range.
pub fn format_millis_rfc3339(millis: i64) -> String {
    from_epoch_millis(millis)
        .map(format_rfc3339)
        .unwrap_or_default()
}

/// Calendar date used in export filenames, e.g. `2025-03-01`.
pub fn date_stamp(at: OffsetDateTime) -> String {
    at.format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "export".into())
}
