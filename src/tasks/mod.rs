//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod display_tick;

// Re-export main functions
pub use display_tick::{display_tick_task, DISPLAY_TICK_INTERVAL};
