//! Timestamp helpers for NetFS.
//!
//! SQLite stores `updated_at` as `YYYY-MM-DD HH:MM:SS` in UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a database timestamp (SQLite format or RFC3339) as UTC.
pub fn parse_db_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, SQLITE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(datetime_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert a database timestamp to RFC3339 for API responses.
///
/// Unparseable input is returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    match parse_db_datetime(datetime_str) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => datetime_str.to_string(),
    }
}
