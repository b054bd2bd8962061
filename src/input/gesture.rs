//! Press gesture disambiguation (short-press vs. long-press)

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::error;

/// Hold time separating a short press from a long press
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(400);

/// When the long-press action fires relative to the press lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPressMode {
    /// Fire the long-press action the moment the threshold elapses,
    /// without waiting for release; the release is then consumed
    FireOnThreshold,
    /// Classify on release by comparing held time against the threshold
    FireOnRelease,
}

/// Actions a control dispatches once a press has been classified
pub trait PressActions: Send + Sync {
    fn short_press(&self);
    fn long_press(&self);
}

#[derive(Debug)]
struct PressTracking {
    /// Bumped on every press, release, and cancel; a pending threshold
    /// callback only fires while its press is still the current one
    seq: u64,
    pressed_at: Option<Instant>,
    long_fired: bool,
}

enum Dispatch {
    Short,
    Long,
}

/// Classifies press/release/cancel sequences on one control and
/// dispatches the configured actions.
///
/// Both long-press mechanisms share this type: the timer widget uses
/// [`LongPressMode::FireOnThreshold`], the cover controls use
/// [`LongPressMode::FireOnRelease`].
pub struct GestureArbiter {
    threshold: Duration,
    mode: LongPressMode,
    actions: Arc<dyn PressActions>,
    tracking: Mutex<PressTracking>,
}

impl GestureArbiter {
    /// Create an arbiter for one control
    pub fn new(mode: LongPressMode, threshold: Duration, actions: Arc<dyn PressActions>) -> Self {
        Self {
            threshold,
            mode,
            actions,
            tracking: Mutex::new(PressTracking {
                seq: 0,
                pressed_at: None,
                long_fired: false,
            }),
        }
    }

    /// Record a press-start.
    ///
    /// In fire-on-threshold mode this arms a one-shot delayed callback
    /// that dispatches the long-press action unless the press ends
    /// first.
    pub fn press(self: &Arc<Self>) -> Result<(), String> {
        let seq = {
            let mut tracking = self
                .tracking
                .lock()
                .map_err(|e| format!("Failed to lock press tracking: {}", e))?;
            tracking.seq = tracking.seq.wrapping_add(1);
            tracking.pressed_at = Some(Instant::now());
            tracking.long_fired = false;
            tracking.seq
        };

        if self.mode == LongPressMode::FireOnThreshold {
            let arbiter = Arc::clone(self);
            tokio::spawn(async move {
                sleep(arbiter.threshold).await;
                arbiter.fire_long_press(seq);
            });
        }

        Ok(())
    }

    /// Record a release and dispatch the classified action.
    ///
    /// A release with no pending press (after a cancel, or a stray
    /// event) does nothing. A release after the threshold callback
    /// already fired is consumed without dispatching.
    pub fn release(&self) -> Result<(), String> {
        let outcome = {
            let mut tracking = self
                .tracking
                .lock()
                .map_err(|e| format!("Failed to lock press tracking: {}", e))?;
            let Some(pressed_at) = tracking.pressed_at.take() else {
                return Ok(());
            };
            tracking.seq = tracking.seq.wrapping_add(1);

            if tracking.long_fired {
                tracking.long_fired = false;
                None
            } else {
                match self.mode {
                    LongPressMode::FireOnThreshold => Some(Dispatch::Short),
                    LongPressMode::FireOnRelease => {
                        if pressed_at.elapsed() >= self.threshold {
                            Some(Dispatch::Long)
                        } else {
                            Some(Dispatch::Short)
                        }
                    }
                }
            }
        };

        match outcome {
            Some(Dispatch::Short) => self.actions.short_press(),
            Some(Dispatch::Long) => self.actions.long_press(),
            None => {}
        }

        Ok(())
    }

    /// Discard the pending press without dispatching anything (pointer
    /// left the control, or the platform cancelled the gesture)
    pub fn cancel(&self) -> Result<(), String> {
        let mut tracking = self
            .tracking
            .lock()
            .map_err(|e| format!("Failed to lock press tracking: {}", e))?;
        tracking.seq = tracking.seq.wrapping_add(1);
        tracking.pressed_at = None;
        tracking.long_fired = false;
        Ok(())
    }

    fn fire_long_press(&self, seq: u64) {
        let tracking = self.tracking.lock();
        let mut tracking = match tracking {
            Ok(tracking) => tracking,
            Err(e) => {
                error!("Failed to lock press tracking: {}", e);
                return;
            }
        };

        // The press this callback was armed for may already be over
        if tracking.seq != seq || tracking.pressed_at.is_none() || tracking.long_fired {
            return;
        }

        tracking.long_fired = true;
        drop(tracking);
        self.actions.long_press();
    }
}
