//! Countdown timer widget

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::TimerConfig;
use crate::input::gesture::{GestureArbiter, LongPressMode, PressActions, LONG_PRESS_THRESHOLD};
use crate::services::alarm::AlarmLoop;
use crate::state::{
    derive_display, DisplayEvent, TimerDisplay, TimerKey, TimerPhase, TimerRecord, TimerRegistry,
};
use crate::tasks::display_tick::display_tick_task;
use crate::widgets::PressEvent;

/// Drives one timer identity: run transitions, display ticks, and
/// alarm engagement.
///
/// The controller mutates its record only through [`start`],
/// [`reset`], and the tick path; [`peek`] is a pure query. Several
/// controllers may hold the same record when their configurations
/// resolve to the same key, in which case they observe each other's
/// transitions.
///
/// [`start`]: TimerController::start
/// [`reset`]: TimerController::reset
/// [`peek`]: TimerController::peek
pub struct TimerController {
    key: TimerKey,
    sound: Option<String>,
    record: Arc<Mutex<TimerRecord>>,
    alarm: Arc<AlarmLoop>,
    display_tx: broadcast::Sender<DisplayEvent>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl TimerController {
    pub fn new(
        key: TimerKey,
        sound: Option<String>,
        record: Arc<Mutex<TimerRecord>>,
        alarm: Arc<AlarmLoop>,
        display_tx: broadcast::Sender<DisplayEvent>,
    ) -> Self {
        Self {
            key,
            sound,
            record,
            alarm,
            display_tx,
            tick_task: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &TimerKey {
        &self.key
    }

    /// Phase as last committed by a transition or tick; may lag the
    /// wall clock by up to one tick
    pub fn phase(&self) -> Result<TimerPhase, String> {
        let record = self
            .record
            .lock()
            .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
        Ok(record.phase)
    }

    /// Configured target duration of the shared record
    pub fn duration_seconds(&self) -> Result<u64, String> {
        let record = self
            .record
            .lock()
            .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
        Ok(record.duration_seconds)
    }

    /// Begin a run anchored at the current instant and spawn the
    /// display loop for it.
    ///
    /// This is the raw transition and does not check the current
    /// phase; input dispatch gates short presses on phase before
    /// calling it. Starting over a live run re-anchors the record and
    /// the superseded display loop winds down on its own.
    pub fn start(self: &Arc<Self>) -> Result<(), String> {
        let now = Instant::now();
        let (epoch, duration, display) = {
            let mut record = self
                .record
                .lock()
                .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
            record.begin(now);
            (record.epoch, record.duration_seconds, derive_display(&record, now))
        };

        info!("Timer {} started for {}s", self.key, duration);
        self.publish(display);

        let handle = tokio::spawn(display_tick_task(Arc::clone(self), epoch));
        let mut tick_task = self
            .tick_task
            .lock()
            .map_err(|e| format!("Failed to lock tick task for {}: {}", self.key, e))?;
        if let Some(previous) = tick_task.replace(handle) {
            previous.abort();
        }

        Ok(())
    }

    /// Reattach to a run already in progress: commit anything due now
    /// and spawn the display loop for the record's current epoch,
    /// without re-anchoring the run.
    ///
    /// Freshly mounted widgets call this so a record that kept running
    /// across a panel rebuild picks its display loop back up. On an
    /// idle record this does nothing.
    pub fn resume(self: &Arc<Self>) -> Result<(), String> {
        let epoch = {
            let record = self
                .record
                .lock()
                .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
            if record.phase == TimerPhase::Idle {
                return Ok(());
            }
            record.epoch
        };

        if self.tick_guarded(epoch)?.is_none() {
            return Ok(());
        }
        info!("Timer {} reattached to its run", self.key);

        let handle = tokio::spawn(display_tick_task(Arc::clone(self), epoch));
        let mut tick_task = self
            .tick_task
            .lock()
            .map_err(|e| format!("Failed to lock tick task for {}: {}", self.key, e))?;
        if let Some(previous) = tick_task.replace(handle) {
            previous.abort();
        }

        Ok(())
    }

    /// Return to Idle and disengage the alarm.
    ///
    /// Valid from any phase; resetting an idle timer changes nothing
    /// beyond re-publishing its display. The alarm stop is
    /// unconditional since stopping an inactive loop is a no-op.
    pub fn reset(&self) -> Result<(), String> {
        let display = {
            let mut record = self
                .record
                .lock()
                .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
            record.clear();
            derive_display(&record, Instant::now())
        };

        self.alarm.stop(&self.key)?;
        info!("Timer {} reset", self.key);
        self.publish(display);

        Ok(())
    }

    /// Advance the displayed state one step.
    ///
    /// Unlike [`TimerController::peek`] this commits side effects: the
    /// first tick past the target promotes the stored phase to
    /// Overtime (sticky until reset) and, when a sound is configured,
    /// engages the alarm loop exactly once per run.
    pub fn tick(&self) -> Result<TimerDisplay, String> {
        let (display, engage) = {
            let mut record = self
                .record
                .lock()
                .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
            Self::advance(&mut record, Instant::now(), self.sound.is_some())
        };
        self.settle_tick(display, engage)?;
        Ok(display)
    }

    /// Epoch-guarded tick used by the display loop.
    ///
    /// Returns `Ok(None)` once `epoch` no longer names the record's
    /// current run (a reset or restart happened), which tells the loop
    /// to end. The guard and the promotion share one critical section
    /// so a stale loop can never commit anything.
    pub fn tick_guarded(&self, epoch: u64) -> Result<Option<TimerDisplay>, String> {
        let (display, engage) = {
            let mut record = self
                .record
                .lock()
                .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
            if record.epoch != epoch {
                return Ok(None);
            }
            Self::advance(&mut record, Instant::now(), self.sound.is_some())
        };
        self.settle_tick(display, engage)?;
        Ok(Some(display))
    }

    /// Pure derivation of the current display; commits nothing
    pub fn peek(&self) -> Result<TimerDisplay, String> {
        let record = self
            .record
            .lock()
            .map_err(|e| format!("Failed to lock timer record for {}: {}", self.key, e))?;
        Ok(derive_display(&record, Instant::now()))
    }

    /// Stop this widget's display loop without touching the record;
    /// used when the hosting panel is torn down or rebuilt
    pub fn detach(&self) -> Result<(), String> {
        let mut tick_task = self
            .tick_task
            .lock()
            .map_err(|e| format!("Failed to lock tick task for {}: {}", self.key, e))?;
        if let Some(handle) = tick_task.take() {
            handle.abort();
            debug!("Detached display loop for {}", self.key);
        }
        Ok(())
    }

    fn advance(record: &mut TimerRecord, now: Instant, has_sound: bool) -> (TimerDisplay, bool) {
        let display = derive_display(record, now);
        let mut engage = false;

        if display.phase == TimerPhase::Overtime && record.phase != TimerPhase::Overtime {
            record.phase = TimerPhase::Overtime;
            if has_sound && !record.alarm_active {
                record.alarm_active = true;
                engage = true;
            }
        }

        (display, engage)
    }

    fn settle_tick(&self, display: TimerDisplay, engage: bool) -> Result<(), String> {
        if engage {
            if let Some(sound) = &self.sound {
                self.alarm.start(self.key.clone(), sound.clone())?;
            }
        }
        self.publish(display);
        Ok(())
    }

    fn publish(&self, display: TimerDisplay) {
        // Send only fails when nobody is subscribed
        let _ = self.display_tx.send(DisplayEvent {
            key: self.key.clone(),
            display,
        });
    }
}

/// State-dependent dispatch for timer presses: a short press starts an
/// idle timer, resets an overtime one, and is ignored while running; a
/// long press resets from any phase.
pub struct TimerPressActions {
    controller: Arc<TimerController>,
}

impl TimerPressActions {
    pub fn new(controller: Arc<TimerController>) -> Self {
        Self { controller }
    }
}

impl PressActions for TimerPressActions {
    fn short_press(&self) {
        let phase = match self.controller.phase() {
            Ok(phase) => phase,
            Err(e) => {
                error!("Failed to read phase for {}: {}", self.controller.key(), e);
                return;
            }
        };

        let result = match phase {
            TimerPhase::Idle => self.controller.start(),
            TimerPhase::Overtime => self.controller.reset(),
            TimerPhase::Running => {
                debug!("Short press ignored while {} is running", self.controller.key());
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Short press failed for {}: {}", self.controller.key(), e);
        }
    }

    fn long_press(&self) {
        if let Err(e) = self.controller.reset() {
            error!("Long press failed for {}: {}", self.controller.key(), e);
        }
    }
}

/// One mounted timer widget: a controller bound to a shared record,
/// plus the gesture arbiter feeding it
pub struct TimerWidget {
    controller: Arc<TimerController>,
    gesture: Arc<GestureArbiter>,
    title: Option<String>,
}

impl TimerWidget {
    pub fn from_config(
        config: &TimerConfig,
        registry: &TimerRegistry,
        alarm: Arc<AlarmLoop>,
        display_tx: broadcast::Sender<DisplayEvent>,
    ) -> Result<Self, String> {
        let key = match &config.id {
            Some(id) => TimerKey::explicit(id),
            None => TimerKey::derived(config.title.as_deref(), config.duration),
        };
        let record = registry.get_or_create(&key, config.duration)?;
        // Duration changes apply to the live record without resetting
        // its progress
        registry.set_duration(&key, config.duration)?;

        let controller = Arc::new(TimerController::new(
            key,
            config.sound.clone(),
            record,
            alarm,
            display_tx,
        ));
        // A record mid-run keeps ticking across remounts
        controller.resume()?;

        let gesture = Arc::new(GestureArbiter::new(
            LongPressMode::FireOnThreshold,
            LONG_PRESS_THRESHOLD,
            Arc::new(TimerPressActions::new(Arc::clone(&controller))),
        ));

        Ok(Self {
            controller,
            gesture,
            title: config.title.clone(),
        })
    }

    pub fn controller(&self) -> &Arc<TimerController> {
        &self.controller
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn handle_input(&self, event: PressEvent) -> Result<(), String> {
        match event {
            PressEvent::Press => self.gesture.press(),
            PressEvent::Release => self.gesture.release(),
            PressEvent::Cancel => self.gesture.cancel(),
        }
    }

    /// Cancel pending input and stop the display loop; the shared
    /// record survives for the next mount
    pub fn teardown(&self) -> Result<(), String> {
        self.gesture.cancel()?;
        self.controller.detach()
    }
}
