//! Panel widgets
//!
//! Each widget couples its configuration to the shared services: timers
//! run against the registry and alarm loop, covers dispatch travel
//! commands to the bus, and the clock reads the wall clock.

pub mod clock;
pub mod cover;
pub mod timer;

// Re-export main types
pub use clock::ClockWidget;
pub use cover::CoverWidget;
pub use timer::{TimerController, TimerWidget};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::WidgetConfig;
use crate::services::alarm::AlarmLoop;
use crate::services::bus::CommandBus;
use crate::state::{DisplayEvent, TimerPhase, TimerRegistry};
use crate::utils::format_mmss;

/// Press lifecycle event delivered by the panel frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressEvent {
    Press,
    Release,
    Cancel,
}

/// Which control of a two-control widget an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverControl {
    Up,
    Down,
}

/// How a widget disposed of an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Forwarded into the widget's gesture arbiter
    Accepted,
    /// The widget has no input surface
    Ignored,
    /// The request shape does not fit the widget
    Rejected(&'static str),
}

/// Externally visible state of one widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetSnapshot {
    Timer {
        title: Option<String>,
        phase: TimerPhase,
        seconds: u64,
        label: String,
        duration_seconds: u64,
    },
    Cover {
        title: Option<String>,
        entity: String,
        show_status: bool,
    },
    Clock {
        time: String,
    },
}

/// One mounted widget on the panel
pub enum WidgetInstance {
    Timer(TimerWidget),
    Cover(CoverWidget),
    Clock(ClockWidget),
}

impl WidgetInstance {
    pub fn from_config(
        config: &WidgetConfig,
        registry: &TimerRegistry,
        alarm: &Arc<AlarmLoop>,
        bus: &Arc<dyn CommandBus>,
        display_tx: &broadcast::Sender<DisplayEvent>,
    ) -> Result<Self, String> {
        match config {
            WidgetConfig::Timer(timer) => Ok(Self::Timer(TimerWidget::from_config(
                timer,
                registry,
                Arc::clone(alarm),
                display_tx.clone(),
            )?)),
            WidgetConfig::Cover(cover) => {
                Ok(Self::Cover(CoverWidget::from_config(cover, Arc::clone(bus))))
            }
            WidgetConfig::Clock => Ok(Self::Clock(ClockWidget::new())),
        }
    }

    pub fn handle_input(
        &self,
        event: PressEvent,
        control: Option<CoverControl>,
    ) -> Result<InputOutcome, String> {
        match self {
            WidgetInstance::Timer(timer) => {
                timer.handle_input(event)?;
                Ok(InputOutcome::Accepted)
            }
            WidgetInstance::Cover(cover) => match control {
                Some(control) => {
                    cover.handle_input(event, control)?;
                    Ok(InputOutcome::Accepted)
                }
                None => Ok(InputOutcome::Rejected(
                    "cover input requires a control of up or down",
                )),
            },
            WidgetInstance::Clock(_) => Ok(InputOutcome::Ignored),
        }
    }

    /// Snapshot for the HTTP surface; timers peek without committing
    /// anything
    pub fn snapshot(&self) -> Result<WidgetSnapshot, String> {
        match self {
            WidgetInstance::Timer(timer) => {
                let display = timer.controller().peek()?;
                Ok(WidgetSnapshot::Timer {
                    title: timer.title().map(str::to_string),
                    phase: display.phase,
                    seconds: display.seconds,
                    label: format_mmss(display.seconds),
                    duration_seconds: timer.controller().duration_seconds()?,
                })
            }
            WidgetInstance::Cover(cover) => Ok(WidgetSnapshot::Cover {
                title: cover.title().map(str::to_string),
                entity: cover.entity().to_string(),
                show_status: cover.show_status(),
            }),
            WidgetInstance::Clock(clock) => Ok(WidgetSnapshot::Clock { time: clock.time() }),
        }
    }

    pub fn teardown(&self) -> Result<(), String> {
        match self {
            WidgetInstance::Timer(timer) => timer.teardown(),
            WidgetInstance::Cover(cover) => cover.teardown(),
            WidgetInstance::Clock(_) => Ok(()),
        }
    }
}
