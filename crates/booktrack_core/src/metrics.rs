//! crates/booktrack_core/src/metrics.rs
//!
//! Dashboard aggregate metrics derived from the activity ledger:
//! the daily reading streak and the trailing-window velocity.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::domain::ReadingActivitySample;

/// Trailing window the velocity average is computed over, in days.
/// Overridable through service configuration.
pub const DEFAULT_VELOCITY_WINDOW_DAYS: u32 = 30;

/// Counts consecutive calendar days with at least one activity sample,
/// ending today or yesterday (a streak is not broken until a full day has
/// passed with no reading). Any gap day breaks it.
pub fn streak(samples: &[ReadingActivitySample], now: DateTime<Utc>) -> u32 {
    let active_days: HashSet<NaiveDate> =
        samples.iter().map(|s| s.recorded_at.date_naive()).collect();

    let today = now.date_naive();
    let mut cursor = if active_days.contains(&today) {
        today
    } else {
        let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
            return 0;
        };
        if !active_days.contains(&yesterday) {
            return 0;
        }
        yesterday
    };

    let mut count = 0u32;
    while active_days.contains(&cursor) {
        count += 1;
        match cursor.checked_sub_days(Days::new(1)) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    count
}

/// Average pages per day over the trailing `window_days`, from the ledger.
/// Samples older than the window are ignored; an empty window yields 0.
pub fn velocity(
    samples: &[ReadingActivitySample],
    now: DateTime<Utc>,
    window_days: u32,
) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    let cutoff = now - chrono::Duration::days(window_days as i64);
    let total_pages: u64 = samples
        .iter()
        .filter(|s| s.recorded_at > cutoff && s.recorded_at <= now)
        .map(|s| s.pages as u64)
        .sum();
    total_pages as f64 / window_days as f64
}

//=========================================================================================
// Tests
//=========================================================================================
