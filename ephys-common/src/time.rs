//! Timestamp utilities
//!
//! Acquisition headers carry naive wall-clock times, so every datetime in the
//! store is a `NaiveDateTime` rendered with [`DATETIME_FORMAT`].

use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::time::SystemTime;

/// Storage and hashing format for datetimes
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a datetime for storage
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a datetime previously written by [`format_datetime`]
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("Invalid datetime '{}': {}", s, e)))
}

/// Convert a filesystem timestamp to local wall-clock time, truncated to whole seconds
pub fn system_time_to_local(t: SystemTime) -> NaiveDateTime {
    let local: DateTime<Local> = t.into();
    let naive = local.naive_local();
    naive.with_nanosecond(0).unwrap_or(naive)
}
