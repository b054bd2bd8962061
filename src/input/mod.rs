//! Input handling module
//!
//! This module turns raw press lifecycle events into classified short
//! and long presses.

pub mod gesture;

// Re-export main types
pub use gesture::{GestureArbiter, LongPressMode, PressActions, LONG_PRESS_THRESHOLD};
