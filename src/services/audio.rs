//! Audible cue playback via an external audio player

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

use crate::state::TimerKey;

/// Plays and silences the audible cue belonging to one timer identity.
///
/// Playback failures are logged and swallowed: a missing player binary
/// or a bad sound path must never disturb timer state.
pub trait CuePlayer: Send + Sync {
    /// Play `sound` for `key`, restarting from the beginning if a cue
    /// for that key is already sounding
    fn play(&self, key: &TimerKey, sound: &str);

    /// Stop the cue for `key` if one is sounding
    fn silence(&self, key: &TimerKey);
}

/// Spawns one audio player process per sounding cue, keyed by timer
/// identity
pub struct ProcessCuePlayer {
    command: String,
    children: Mutex<HashMap<TimerKey, Child>>,
}

impl ProcessCuePlayer {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            children: Mutex::new(HashMap::new()),
        }
    }
}

impl CuePlayer for ProcessCuePlayer {
    fn play(&self, key: &TimerKey, sound: &str) {
        let spawned = Command::new(&self.command)
            .arg(sound)
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {} for {}: {}", self.command, sound, e);
                return;
            }
        };

        debug!("Playing {} for {}", sound, key);
        match self.children.lock() {
            Ok(mut children) => {
                // Replacing the entry drops the previous child, which
                // kills it and restarts the cue from the beginning
                children.insert(key.clone(), child);
            }
            Err(e) => {
                error!("Failed to lock cue table: {}", e);
            }
        }
    }

    fn silence(&self, key: &TimerKey) {
        match self.children.lock() {
            Ok(mut children) => {
                if children.remove(key).is_some() {
                    debug!("Silenced cue for {}", key);
                }
            }
            Err(e) => {
                error!("Failed to lock cue table: {}", e);
            }
        }
    }
}
