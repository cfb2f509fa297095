//! Monthly partition routing for error-log storage.
//!
//! Error logs are stored in monthly database partitions. This module owns the
//! decision rule only: which month's partition a timestamp belongs to.
//! Creating and dropping the physical partitions is an external scheduled
//! maintenance task.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Name of the error-log partition a timestamp routes to,
/// e.g. `error_log_y2026m08`.
pub fn error_log_partition(ts: DateTime<Utc>) -> String {
    format!("error_log_y{:04}m{:02}", ts.year(), ts.month())
}

/// Half-open UTC month bounds `[start, end)` for the partition containing the
/// timestamp.
pub fn partition_month_bounds(ts: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(ts.year(), ts.month(), 1, 0, 0, 0)
        .unwrap();
    let (next_year, next_month) = if ts.month() == 12 {
        (ts.year() + 1, 1)
    } else {
        (ts.year(), ts.month() + 1)
    };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).unwrap();
    (start, end)
}
