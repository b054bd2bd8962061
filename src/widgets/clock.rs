//! Wall-clock widget

use crate::utils::format_clock;

/// Stateless clock readout; every snapshot is the current local time
pub struct ClockWidget;

impl ClockWidget {
    pub fn new() -> Self {
        Self
    }

    /// Current local time as `HH:MM:SS`
    pub fn time(&self) -> String {
        format_clock(chrono::Local::now())
    }
}

impl Default for ClockWidget {
    fn default() -> Self {
        Self::new()
    }
}
