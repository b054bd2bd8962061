//! Configuration and CLI argument handling

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "homepanel")]
#[command(about = "A state-managed widget service for smart-home control panels")]
#[command(version = "0.4.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8090")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Path to the panel layout file
    #[arg(long, default_value = "panel.json")]
    pub panel: PathBuf,

    /// Base URL of the home automation hub REST API
    #[arg(long)]
    pub bus_url: Option<String>,

    /// Bearer token for the hub REST API
    #[arg(long)]
    pub bus_token: Option<String>,

    /// Audio player command used for alarm cues
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn default_duration() -> u64 {
    60
}

/// Countdown timer widget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Explicit identity; timers without one share state by title and
    /// duration
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Target duration in seconds
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Audio resource played while in overtime; absent means silent
    #[serde(default)]
    pub sound: Option<String>,
}

/// Cover widget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverConfig {
    #[serde(default)]
    pub title: Option<String>,
    /// Hub entity the travel commands address
    pub entity: String,
    #[serde(default)]
    pub show_status: bool,
}

/// One widget slot on the panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetConfig {
    Timer(TimerConfig),
    Cover(CoverConfig),
    Clock,
}

/// Panel layout: the ordered list of widgets to mount
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

impl PanelConfig {
    /// Reject layouts the widget layer must never see
    pub fn validate(&self) -> Result<(), String> {
        for (index, widget) in self.widgets.iter().enumerate() {
            match widget {
                WidgetConfig::Timer(timer) => {
                    if timer.duration == 0 {
                        return Err(format!("widget {}: timer duration must be positive", index));
                    }
                }
                WidgetConfig::Cover(cover) => {
                    if cover.entity.is_empty() {
                        return Err(format!("widget {}: cover entity must not be empty", index));
                    }
                }
                WidgetConfig::Clock => {}
            }
        }
        Ok(())
    }
}

/// Load and validate a panel layout from a JSON file
pub fn load_panel_config(path: &Path) -> Result<PanelConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read panel layout {}: {}", path.display(), e))?;
    let panel: PanelConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse panel layout {}: {}", path.display(), e))?;
    panel.validate()?;
    Ok(panel)
}
