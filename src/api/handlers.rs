//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::state::AppState;
use crate::widgets::{CoverControl, InputOutcome, PressEvent, WidgetSnapshot};
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Request body for POST /widgets/:index/input
#[derive(Debug, Clone, Deserialize)]
pub struct InputRequest {
    pub event: PressEvent,
    #[serde(default)]
    pub control: Option<CoverControl>,
}

/// Handle GET /widgets - Snapshot every mounted widget in panel order
pub async fn widgets_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WidgetSnapshot>>, StatusCode> {
    match state.snapshot_widgets() {
        Ok(widgets) => Ok(Json(widgets)),
        Err(e) => {
            error!("Failed to snapshot widgets: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /widgets/:index - Snapshot one widget
pub async fn widget_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<WidgetSnapshot>, StatusCode> {
    match state.snapshot_widget(index) {
        Ok(Some(widget)) => Ok(Json(widget)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to snapshot widget {}: {}", index, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /widgets/:index/input - Deliver a press event to a widget
pub async fn input_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(request): Json<InputRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let outcome = match state.dispatch_input(index, request.event, request.control) {
        Ok(Some(outcome)) => outcome,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to dispatch input to widget {}: {}", index, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let widget = match state.snapshot_widget(index) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to snapshot widget {} after input: {}", index, e);
            None
        }
    };

    match outcome {
        InputOutcome::Accepted => {
            state.record_action(&format!("input widget {}", index));
            info!("Input {:?} delivered to widget {}", request.event, index);
            Ok(Json(ApiResponse::accepted(
                format!("Input delivered to widget {}", index),
                widget,
            )))
        }
        InputOutcome::Ignored => Ok(Json(ApiResponse::ignored(
            format!("Widget {} takes no input", index),
            widget,
        ))),
        InputOutcome::Rejected(reason) => {
            warn!("Input rejected for widget {}: {}", index, reason);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Handle POST /reload - Re-read the panel layout and remount widgets
pub async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reload() {
        Ok(count) => {
            state.record_action("reload");
            info!("Reload endpoint called - {} widgets mounted", count);
            Ok(Json(ApiResponse::ok(format!(
                "Panel reloaded with {} widgets",
                count
            ))))
        }
        Err(e) => {
            error!("Failed to reload panel: {}", e);
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
    }
}

/// Handle GET /status - Return current panel status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let widgets = match state.widget_count() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count widgets: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let timers = match state.registry.len() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count timer records: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let active_alarms = match state.alarm.active_count() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count alarm loops: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        widgets,
        timers,
        active_alarms,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
