//! Main application state management

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::{load_panel_config, PanelConfig};
use crate::services::{AlarmLoop, CommandBus};
use crate::widgets::{CoverControl, InputOutcome, PressEvent, WidgetInstance, WidgetSnapshot};

use super::{DisplayEvent, TimerRegistry};

/// Main application state shared by handlers and background tasks
pub struct AppState {
    /// Process-wide timer records, keyed by widget identity
    pub registry: Arc<TimerRegistry>,
    /// Repeating cue loops for timers in overtime
    pub alarm: Arc<AlarmLoop>,
    /// Outbound command dispatch to the hub
    pub bus: Arc<dyn CommandBus>,
    /// Widgets currently mounted on the panel
    pub widgets: Mutex<Vec<WidgetInstance>>,
    /// Panel layout file, re-read on reload
    pub panel_path: PathBuf,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Channel for display updates
    pub display_tx: broadcast::Sender<DisplayEvent>,
    /// Keep one receiver alive to prevent channel closure
    pub _display_rx: broadcast::Receiver<DisplayEvent>,
}

impl AppState {
    /// Create a new AppState with an empty panel
    pub fn new(
        port: u16,
        host: String,
        panel_path: PathBuf,
        bus: Arc<dyn CommandBus>,
        alarm: Arc<AlarmLoop>,
    ) -> Self {
        let (display_tx, display_rx) = broadcast::channel(100);

        Self {
            registry: Arc::new(TimerRegistry::new()),
            alarm,
            bus,
            widgets: Mutex::new(Vec::new()),
            panel_path,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            display_tx,
            _display_rx: display_rx,
        }
    }

    /// Mount the widgets a panel layout describes, tearing down
    /// whatever is currently mounted.
    ///
    /// Timer records live in the registry and survive the swap, so a
    /// running timer keeps its progress across reloads; only the
    /// widget instances and their input arbiters are rebuilt.
    pub fn install_panel(&self, panel: &PanelConfig) -> Result<usize, String> {
        let mut built = Vec::with_capacity(panel.widgets.len());
        for config in &panel.widgets {
            built.push(WidgetInstance::from_config(
                config,
                &self.registry,
                &self.alarm,
                &self.bus,
                &self.display_tx,
            )?);
        }

        let mut widgets = self
            .widgets
            .lock()
            .map_err(|e| format!("Failed to lock widgets: {}", e))?;
        for widget in widgets.iter() {
            if let Err(e) = widget.teardown() {
                warn!("Failed to tear down widget: {}", e);
            }
        }
        let count = built.len();
        *widgets = built;

        info!("Panel installed with {} widgets", count);
        Ok(count)
    }

    /// Re-read the panel layout from disk and remount its widgets
    pub fn reload(&self) -> Result<usize, String> {
        info!("Reloading panel layout from {}", self.panel_path.display());
        let panel = load_panel_config(&self.panel_path)?;
        self.install_panel(&panel)
    }

    /// Route an input event to the widget at `index`; `Ok(None)` means
    /// no widget lives there
    pub fn dispatch_input(
        &self,
        index: usize,
        event: PressEvent,
        control: Option<CoverControl>,
    ) -> Result<Option<InputOutcome>, String> {
        let widgets = self
            .widgets
            .lock()
            .map_err(|e| format!("Failed to lock widgets: {}", e))?;
        match widgets.get(index) {
            Some(widget) => widget.handle_input(event, control).map(Some),
            None => Ok(None),
        }
    }

    /// Snapshot every mounted widget in panel order
    pub fn snapshot_widgets(&self) -> Result<Vec<WidgetSnapshot>, String> {
        let widgets = self
            .widgets
            .lock()
            .map_err(|e| format!("Failed to lock widgets: {}", e))?;
        widgets.iter().map(|widget| widget.snapshot()).collect()
    }

    /// Snapshot one widget by its panel position
    pub fn snapshot_widget(&self, index: usize) -> Result<Option<WidgetSnapshot>, String> {
        let widgets = self
            .widgets
            .lock()
            .map_err(|e| format!("Failed to lock widgets: {}", e))?;
        widgets.get(index).map(|widget| widget.snapshot()).transpose()
    }

    /// Number of widgets currently mounted
    pub fn widget_count(&self) -> Result<usize, String> {
        let widgets = self
            .widgets
            .lock()
            .map_err(|e| format!("Failed to lock widgets: {}", e))?;
        Ok(widgets.len())
    }

    /// Record the most recent mutating request for the status surface
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
