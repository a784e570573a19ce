//! Time utilities.
//!
//! Conversions between the epoch-seconds integers carried by rate-service
//! responses and `chrono` types, plus the `yyyy-MM-dd` formatting used in
//! historical-rate URLs.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{ContentError, Result};

/// Current time in milliseconds since the Unix epoch.
#[inline]
pub fn milliseconds() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts an epoch-seconds value to a UTC timestamp at millisecond
/// resolution (`seconds * 1000`).
///
/// # Errors
///
/// Fails with a content error when the value overflows the representable
/// timestamp range.
pub fn from_epoch_seconds(seconds: i64) -> Result<DateTime<Utc>> {
    let millis = seconds.checked_mul(1000).ok_or_else(|| {
        ContentError::invalid_value("timestamp", "epoch seconds out of range")
    })?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        ContentError::invalid_value("timestamp", "epoch seconds out of range").into()
    })
}

/// Formats a date as `yyyy-MM-dd`.
pub fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
