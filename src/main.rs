//! Homepanel - A state-managed widget service for smart-home control panels
//!
//! This is the main entry point for the homepanel application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use homepanel::{
    api::create_router,
    config::{load_panel_config, Config},
    services::{AlarmLoop, CommandBus, HttpCommandBus, NullCommandBus, ProcessCuePlayer},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("homepanel={},tower_http=info", config.log_level()))
        .init();

    info!("Starting homepanel service v0.4.0");
    info!(
        "Configuration: host={}, port={}, panel={}",
        config.host,
        config.port,
        config.panel.display()
    );

    // Load the panel layout up front so a broken file fails fast
    let panel = match load_panel_config(&config.panel) {
        Ok(panel) => panel,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Wire the command bus; without a hub URL commands are logged and
    // dropped
    let bus: Arc<dyn CommandBus> = match &config.bus_url {
        Some(url) => Arc::new(HttpCommandBus::new(url, config.bus_token.clone())),
        None => Arc::new(NullCommandBus),
    };

    let player = Arc::new(ProcessCuePlayer::new(&config.player));
    let alarm = Arc::new(AlarmLoop::new(player));

    // Create application state and mount the panel
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.panel.clone(),
        bus,
        alarm,
    ));
    if let Err(e) = state.install_panel(&panel) {
        tracing::error!("Failed to mount panel: {}", e);
        std::process::exit(1);
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /widgets              - List widget snapshots");
    info!("  GET  /widgets/:index       - Snapshot one widget");
    info!("  POST /widgets/:index/input - Deliver a press event");
    info!("  POST /reload               - Remount the panel layout");
    info!("  GET  /status               - Panel status");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
