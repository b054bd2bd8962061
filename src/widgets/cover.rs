//! Cover (blinds/shutter) widget

use std::sync::Arc;

use tracing::debug;

use crate::config::CoverConfig;
use crate::input::gesture::{GestureArbiter, LongPressMode, PressActions, LONG_PRESS_THRESHOLD};
use crate::services::bus::CommandBus;
use crate::widgets::{CoverControl, PressEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoverCommand {
    Open,
    Close,
    Stop,
}

impl CoverCommand {
    fn service(self) -> &'static str {
        match self {
            CoverCommand::Open => "open_cover",
            CoverCommand::Close => "close_cover",
            CoverCommand::Stop => "stop_cover",
        }
    }
}

/// Press dispatch for one cover control: holding past the threshold
/// runs the control's travel command, a short tap always stops travel
struct CoverPressActions {
    bus: Arc<dyn CommandBus>,
    entity: String,
    long: CoverCommand,
}

impl PressActions for CoverPressActions {
    fn short_press(&self) {
        self.bus
            .call_service("cover", CoverCommand::Stop.service(), &self.entity);
    }

    fn long_press(&self) {
        self.bus.call_service("cover", self.long.service(), &self.entity);
    }
}

/// Two-control cover widget.
///
/// Each control classifies on release: the up control opens on a long
/// press, the down control closes, and a short tap on either stops
/// whatever travel is underway.
pub struct CoverWidget {
    title: Option<String>,
    entity: String,
    show_status: bool,
    up: Arc<GestureArbiter>,
    down: Arc<GestureArbiter>,
}

impl CoverWidget {
    pub fn from_config(config: &CoverConfig, bus: Arc<dyn CommandBus>) -> Self {
        let up = Arc::new(GestureArbiter::new(
            LongPressMode::FireOnRelease,
            LONG_PRESS_THRESHOLD,
            Arc::new(CoverPressActions {
                bus: Arc::clone(&bus),
                entity: config.entity.clone(),
                long: CoverCommand::Open,
            }),
        ));
        let down = Arc::new(GestureArbiter::new(
            LongPressMode::FireOnRelease,
            LONG_PRESS_THRESHOLD,
            Arc::new(CoverPressActions {
                bus,
                entity: config.entity.clone(),
                long: CoverCommand::Close,
            }),
        ));

        Self {
            title: config.title.clone(),
            entity: config.entity.clone(),
            show_status: config.show_status,
            up,
            down,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn show_status(&self) -> bool {
        self.show_status
    }

    pub fn handle_input(&self, event: PressEvent, control: CoverControl) -> Result<(), String> {
        let arbiter = match control {
            CoverControl::Up => &self.up,
            CoverControl::Down => &self.down,
        };
        match event {
            PressEvent::Press => arbiter.press(),
            PressEvent::Release => arbiter.release(),
            PressEvent::Cancel => arbiter.cancel(),
        }
    }

    pub fn teardown(&self) -> Result<(), String> {
        debug!("Tearing down cover controls for {}", self.entity);
        self.up.cancel()?;
        self.down.cancel()
    }
}
