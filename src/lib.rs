//! Homepanel - A state-managed widget service for smart-home control panels
//!
//! This library hosts the panel's widgets behind an HTTP surface: countdown
//! timers with overtime alarms, cover controls with press-and-hold travel,
//! and a wall clock. Timer state is kept in a process-wide registry so
//! widgets sharing an identity observe one record.

pub mod api;
pub mod config;
pub mod input;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;
pub mod widgets;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
