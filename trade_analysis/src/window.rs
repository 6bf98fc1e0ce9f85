//! Historical request window.

use chrono::{DateTime, Duration, Utc};

/// The `hours`-long window ending `days_back` days before `now`.
///
/// Ending in the past keeps requests clear of data the feed has not settled yet.
pub fn select_window(now: DateTime<Utc>, days_back: u32, hours: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = now - Duration::days(i64::from(days_back));
    let start = end - Duration::hours(i64::from(hours));
    (start, end)
}
