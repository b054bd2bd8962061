//! Repeating alarm cue loops for timers in overtime

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::services::audio::CuePlayer;
use crate::state::TimerKey;

/// Interval between alarm cue repetitions
pub const ALARM_REPEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Keeps at most one repeating cue loop per timer identity.
///
/// Starting a loop for a key that already has one replaces it, so the
/// observable effect never exceeds one cue every repeat interval no
/// matter how many times the alarm is engaged.
pub struct AlarmLoop {
    player: Arc<dyn CuePlayer>,
    loops: Mutex<HashMap<TimerKey, JoinHandle<()>>>,
}

impl AlarmLoop {
    pub fn new(player: Arc<dyn CuePlayer>) -> Self {
        Self {
            player,
            loops: Mutex::new(HashMap::new()),
        }
    }

    /// Engage the alarm for `key`: play the cue immediately, then
    /// again every [`ALARM_REPEAT_INTERVAL`] until [`AlarmLoop::stop`]
    pub fn start(self: &Arc<Self>, key: TimerKey, sound: String) -> Result<(), String> {
        let mut loops = self
            .loops
            .lock()
            .map_err(|e| format!("Failed to lock alarm table: {}", e))?;

        if let Some(handle) = loops.remove(&key) {
            handle.abort();
            debug!("Replaced running alarm loop for {}", key);
        }

        info!("Alarm engaged for {}", key);
        self.player.play(&key, &sound);

        let alarm = Arc::clone(self);
        let loop_key = key.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(ALARM_REPEAT_INTERVAL);
            // The first tick completes immediately and the cue has
            // already been played once
            interval.tick().await;
            loop {
                interval.tick().await;
                alarm.player.play(&loop_key, &sound);
            }
        });
        loops.insert(key, handle);

        Ok(())
    }

    /// Disengage the alarm for `key` and silence any cue in flight.
    /// Safe to call when no loop is running.
    pub fn stop(&self, key: &TimerKey) -> Result<(), String> {
        let mut loops = self
            .loops
            .lock()
            .map_err(|e| format!("Failed to lock alarm table: {}", e))?;

        if let Some(handle) = loops.remove(key) {
            handle.abort();
            info!("Alarm disengaged for {}", key);
        }
        self.player.silence(key);

        Ok(())
    }

    /// Number of alarm loops currently engaged
    pub fn active_count(&self) -> Result<usize, String> {
        let loops = self
            .loops
            .lock()
            .map_err(|e| format!("Failed to lock alarm table: {}", e))?;
        Ok(loops.len())
    }
}
