//! Timestamp helpers
//!
//! All user-visible timestamps are ISO-8601 UTC with millisecond precision

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC instant as `2024-01-01T00:00:00.000Z`
pub fn to_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as an ISO-8601 string
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

/// Convert epoch milliseconds to an ISO-8601 string
pub fn millis_to_iso(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(to_iso)
}
