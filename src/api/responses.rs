//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::widgets::WidgetSnapshot;

/// API response structure for widget input and panel actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetSnapshot>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, widget: Option<WidgetSnapshot>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            widget,
        }
    }

    /// Input was forwarded into the widget
    pub fn accepted(message: String, widget: Option<WidgetSnapshot>) -> Self {
        Self::new("accepted".to_string(), message, widget)
    }

    /// Input reached a widget that takes none
    pub fn ignored(message: String, widget: Option<WidgetSnapshot>) -> Self {
        Self::new("ignored".to_string(), message, widget)
    }

    /// Panel-level action completed
    pub fn ok(message: String) -> Self {
        Self::new("ok".to_string(), message, None)
    }
}

/// Panel-wide status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub widgets: usize,
    pub timers: usize,
    pub active_alarms: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: "0.4.0".to_string(),
        }
    }
}
