//! Timer record data model and display derivation

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Authoritative phase of a timer record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Overtime,
}

/// Mutable timer state stored in the registry, one per widget identity.
///
/// The invariant `started_at.is_some() == (phase != Idle)` holds after
/// every transition; `begin` and `clear` keep it in one place.
#[derive(Debug, Clone)]
pub struct TimerRecord {
    /// Last-known phase; Overtime is sticky until the next reset
    pub phase: TimerPhase,
    /// Set when transitioning to Running, cleared on reset
    pub started_at: Option<Instant>,
    /// Configured target duration; may change while the timer runs
    pub duration_seconds: u64,
    /// Whether the repeating alarm cue is engaged for this record
    pub alarm_active: bool,
    /// Run epoch, bumped on every start/reset; stale tick loops compare
    /// against it and bail out
    pub epoch: u64,
}

impl TimerRecord {
    /// Create a fresh Idle record with the configured duration
    pub fn new(duration_seconds: u64) -> Self {
        Self {
            phase: TimerPhase::Idle,
            started_at: None,
            duration_seconds,
            alarm_active: false,
            epoch: 0,
        }
    }

    /// Transition to Running, anchored at `now`
    pub fn begin(&mut self, now: Instant) {
        self.phase = TimerPhase::Running;
        self.started_at = Some(now);
        self.alarm_active = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Transition back to Idle, clearing the anchor and alarm flag
    pub fn clear(&mut self) {
        self.phase = TimerPhase::Idle;
        self.started_at = None;
        self.alarm_active = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Check if the record is idle
    pub fn is_idle(&self) -> bool {
        self.phase == TimerPhase::Idle
    }
}

/// Derived display state, recomputed from a record and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDisplay {
    pub phase: TimerPhase,
    /// Remaining seconds while running, seconds past the target while in
    /// overtime, the configured duration while idle
    pub seconds: u64,
}

/// Display refresh published on every tick and transition
#[derive(Debug, Clone)]
pub struct DisplayEvent {
    pub key: super::TimerKey,
    pub display: TimerDisplay,
}

/// Compute the displayed phase and seconds for a record at `now`.
///
/// Pure: promotion of the stored phase to Overtime and alarm engagement
/// happen in the tick path, not here.
pub fn derive_display(record: &TimerRecord, now: Instant) -> TimerDisplay {
    let started_at = match record.started_at {
        Some(at) if record.phase != TimerPhase::Idle => at,
        _ => {
            return TimerDisplay {
                phase: TimerPhase::Idle,
                seconds: record.duration_seconds,
            }
        }
    };

    let elapsed = now.saturating_duration_since(started_at).as_secs();
    if elapsed < record.duration_seconds {
        TimerDisplay {
            phase: TimerPhase::Running,
            seconds: record.duration_seconds - elapsed,
        }
    } else {
        TimerDisplay {
            phase: TimerPhase::Overtime,
            seconds: elapsed - record.duration_seconds,
        }
    }
}
