//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 local timestamp without fractional seconds, as stored in the tracker
pub fn iso_stamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Filesystem- and sheet-name-safe timestamp with millisecond precision
///
/// e.g. `2024-02-05T14-03-07.123`
pub fn file_stamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S%.3f").to_string()
}
