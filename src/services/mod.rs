//! External side-effect services
//!
//! This module contains the outbound command bus, audible cue playback,
//! and the repeating alarm loop that drives cues for timers in overtime.

pub mod alarm;
pub mod audio;
pub mod bus;

// Re-export main types
pub use alarm::{AlarmLoop, ALARM_REPEAT_INTERVAL};
pub use audio::{CuePlayer, ProcessCuePlayer};
pub use bus::{CommandBus, HttpCommandBus, NullCommandBus};
