//! Display tick background task

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::widgets::TimerController;

/// Cadence of display refreshes while a timer runs
pub const DISPLAY_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that ticks one timer run once per second.
///
/// `epoch` names the run this loop belongs to; the loop ends as soon
/// as a guarded tick reports the run is over. A reset or restart bumps
/// the record's epoch, so a loop left over from a previous run winds
/// down at its next tick without committing anything.
pub async fn display_tick_task(controller: Arc<TimerController>, epoch: u64) {
    debug!("Starting display loop for {}", controller.key());

    let mut interval = tokio::time::interval(DISPLAY_TICK_INTERVAL);
    // The first tick completes immediately and the start transition
    // already published the initial display
    interval.tick().await;

    loop {
        interval.tick().await;
        match controller.tick_guarded(epoch) {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                error!("Display tick failed for {}: {}", controller.key(), e);
                break;
            }
        }
    }

    debug!("Display loop ended for {}", controller.key());
}
