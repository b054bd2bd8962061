//! State management module
//!
//! This module contains the timer records, the process-wide registry
//! that keys them, and the shared application state.

pub mod app_state;
pub mod record;
pub mod registry;

// Re-export main types
pub use app_state::AppState;
pub use record::{derive_display, DisplayEvent, TimerDisplay, TimerPhase, TimerRecord};
pub use registry::{TimerKey, TimerRegistry};
