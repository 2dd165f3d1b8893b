//! Timestamp labels for the dashboard.

use chrono::{DateTime, Utc};

use crate::common::TimeWindow;

/// Label used by every panel when a sensor is not reporting.
pub const OFFLINE_LABEL: &str = "OFFLINE";

/// Age of a reading as shown next to the sensor name.
#[must_use]
pub fn relative_age(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - observed_at).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} mins ago")
    } else {
        format!("{} hours ago", minutes / 60)
    }
}

/// History chart tick: clock time for short windows, date otherwise.
#[must_use]
pub fn axis_tick(time: DateTime<Utc>, window: TimeWindow) -> String {
    if window.is_short() {
        clock(time)
    } else {
        time.format("%b %-d").to_string()
    }
}

/// `HH:MM`
#[must_use]
pub fn clock(time: DateTime<Utc>) -> String {
    time.format("%H:%M").to_string()
}

/// `Jan 5, 2026 · 14:03:22`
#[must_use]
pub fn full_timestamp(time: DateTime<Utc>) -> String {
    time.format("%b %-d, %Y · %H:%M:%S").to_string()
}
