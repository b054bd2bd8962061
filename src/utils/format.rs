//! Display label formatting

use chrono::{DateTime, Local};

/// Seconds as an `MM:SS` label; minutes are not capped at an hour
pub fn format_mmss(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Local time as an `HH:MM:SS` label
pub fn format_clock(time: DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}
