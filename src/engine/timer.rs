//! Timer state engine.
//!
//! This module provides the countdown state machine:
//! - Controls: toggle, reset, mode switch, direct time-left writes
//! - One-second ticks with fractional focus-minute accounting
//! - Completion transitions (Work → Short/Long break → Work)
//! - The bounded completion alarm window
//!
//! The engine itself never sleeps or spawns; the one-second cadence and the
//! alarm timeout are driven by [`super::TimerService`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::dial::DialTarget;
use crate::durations::{DurationError, DurationStore};
use crate::sound::AlarmPlayer;
use crate::stats::StudyStats;
use crate::storage::{
    read_parsed, write_logged, KeyValueStore, SharedStore, COMPLETED_SESSIONS_KEY,
    TOTAL_FOCUS_MINUTES_KEY,
};
use crate::types::{
    DurationConfig, TimerMode, TimerState, MAX_SECONDS, SESSIONS_PER_LONG_BREAK,
};

use super::event::TimerEvent;

/// How long the alarm flag stays raised after a completion.
pub const ALARM_WINDOW: Duration = Duration::from_secs(3);

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer not running; nothing changed
    Idle,
    /// One second elapsed
    Ticked,
    /// The countdown reached zero and the completion transition ran
    Completed,
}

/// Reads the persisted session counters.
///
/// Missing, malformed, negative or non-finite values read as zero.
pub fn persisted_counters(store: &dyn KeyValueStore) -> (u32, f64) {
    let completed_sessions = read_parsed::<u32>(store, COMPLETED_SESSIONS_KEY).unwrap_or(0);
    let total_focus_minutes = read_parsed::<f64>(store, TOTAL_FOCUS_MINUTES_KEY)
        .filter(|minutes| minutes.is_finite() && *minutes >= 0.0)
        .unwrap_or(0.0);
    (completed_sessions, total_focus_minutes)
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Owns [`TimerState`] and applies every change to it.
pub struct TimerEngine {
    state: TimerState,
    durations: DurationStore,
    store: SharedStore,
    stats: Arc<dyn StudyStats>,
    alarm: Arc<dyn AlarmPlayer>,
    alarm_deadline: Option<Instant>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an engine from persisted state.
    ///
    /// Durations and counters are read from `store`; anything missing or
    /// malformed starts from its default. The countdown always starts in
    /// Work mode at the configured Work duration.
    pub fn new(
        store: SharedStore,
        stats: Arc<dyn StudyStats>,
        alarm: Arc<dyn AlarmPlayer>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let durations = DurationStore::load(store.clone());
        let (completed_sessions, total_focus_minutes) = persisted_counters(store.as_ref());

        debug!(
            completed_sessions,
            total_focus_minutes, "Timer engine initialized"
        );

        Self {
            state: TimerState::new(
                durations.duration(TimerMode::Work),
                completed_sessions,
                total_focus_minutes,
            ),
            durations,
            store,
            stats,
            alarm,
            alarm_deadline: None,
            event_tx,
        }
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns the configured durations.
    pub fn durations(&self) -> DurationConfig {
        self.durations.get()
    }

    /// When the alarm flag auto-clears, if it is raised.
    pub fn alarm_deadline(&self) -> Option<Instant> {
        self.alarm_deadline
    }

    // ------------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------------

    /// Starts or stops the countdown.
    ///
    /// Stopping also dismisses a sounding alarm. Starting with no time left
    /// completes the countdown immediately.
    pub fn toggle_running(&mut self) {
        if self.state.is_running {
            self.state.is_running = false;
            if self.state.is_alarm_playing {
                self.stop_alarm();
            }
            self.emit(TimerEvent::Stopped {
                time_left_seconds: self.state.time_left_seconds,
            });
            return;
        }

        self.state.is_running = true;
        self.emit(TimerEvent::Started {
            mode: self.state.mode,
        });

        if self.state.time_left_seconds == 0 {
            self.complete();
        }
    }

    /// Stops the countdown and restores the mode's configured duration.
    pub fn reset(&mut self) {
        self.stop_alarm();
        self.state.is_running = false;
        self.state.time_left_seconds = self.durations.duration(self.state.mode);
        self.emit(TimerEvent::Reset {
            mode: self.state.mode,
        });
    }

    /// Stops the countdown and enters `mode` at its configured duration.
    ///
    /// The abandoned countdown is not credited.
    pub fn switch_mode(&mut self, mode: TimerMode, announce: bool) {
        self.stop_alarm();
        self.state.is_running = false;

        let from = self.state.mode;
        self.state.mode = mode;
        self.state.time_left_seconds = self.durations.duration(mode);
        self.emit(TimerEvent::ModeSwitched { from, to: mode });

        if announce {
            info!(mode = mode.as_str(), "{}", mode.announcement());
            self.emit(TimerEvent::Announcement {
                mode,
                message: mode.announcement().to_string(),
            });
        }
    }

    /// Overwrites the remaining time, clamped to `[0, MAX_SECONDS]`.
    ///
    /// Reaching zero while running completes the countdown.
    pub fn set_time_left(&mut self, seconds: u32) {
        self.state.time_left_seconds = seconds.min(MAX_SECONDS);
        if self.state.is_running && self.state.time_left_seconds == 0 {
            self.complete();
        }
    }

    /// Dismisses the alarm. Safe to call when it is not playing.
    pub fn stop_alarm(&mut self) {
        let was_playing = self.state.is_alarm_playing;
        self.state.is_alarm_playing = false;
        self.alarm_deadline = None;
        self.alarm.stop();
        if was_playing {
            self.emit(TimerEvent::AlarmStopped);
        }
    }

    /// Replaces the configured durations.
    ///
    /// # Errors
    ///
    /// Returns [`DurationError`] if any entry is out of range; nothing
    /// changes in that case.
    pub fn set_durations(&mut self, config: DurationConfig) -> Result<(), DurationError> {
        self.durations.set(config)?;
        self.emit(TimerEvent::DurationsChanged(config));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Time-driven transitions
    // ------------------------------------------------------------------------

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_running {
            return TickOutcome::Idle;
        }
        if self.state.time_left_seconds == 0 {
            self.complete();
            return TickOutcome::Completed;
        }

        self.state.time_left_seconds -= 1;
        if self.state.mode == TimerMode::Work {
            self.state.total_focus_minutes += 1.0 / 60.0;
            write_logged(
                self.store.as_ref(),
                TOTAL_FOCUS_MINUTES_KEY,
                &self.state.total_focus_minutes.to_string(),
            );
        }
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.state.time_left_seconds,
        });

        if self.state.time_left_seconds == 0 {
            self.complete();
            TickOutcome::Completed
        } else {
            TickOutcome::Ticked
        }
    }

    /// Clears the alarm flag if its window has elapsed at `now`.
    ///
    /// Returns true if the alarm was cleared.
    pub fn expire_alarm(&mut self, now: Instant) -> bool {
        match self.alarm_deadline {
            Some(deadline) if now >= deadline => {
                self.stop_alarm();
                true
            }
            _ => false,
        }
    }

    /// Completion transition: credit work, switch mode, sound the alarm.
    fn complete(&mut self) {
        let finished = self.state.mode;

        if finished == TimerMode::Work {
            self.state.completed_sessions = self.state.completed_sessions.saturating_add(1);
            write_logged(
                self.store.as_ref(),
                COMPLETED_SESSIONS_KEY,
                &self.state.completed_sessions.to_string(),
            );

            let study_minutes = self.durations.duration(TimerMode::Work) / 60;
            self.stats.add_study_time(study_minutes);
            self.stats.increment_focus_session();

            info!(
                completed_sessions = self.state.completed_sessions,
                study_minutes, "Work session completed"
            );
            self.emit(TimerEvent::WorkCompleted {
                completed_sessions: self.state.completed_sessions,
                study_minutes,
            });

            let next = if self.state.completed_sessions % SESSIONS_PER_LONG_BREAK == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            };
            self.switch_mode(next, true);
        } else {
            self.emit(TimerEvent::BreakCompleted { mode: finished });
            self.switch_mode(TimerMode::Work, true);
        }

        // after the switch, which dismisses any earlier alarm
        self.start_alarm();
    }

    fn start_alarm(&mut self) {
        match self.alarm.play() {
            Ok(()) => {
                self.state.is_alarm_playing = true;
                self.alarm_deadline = Some(Instant::now() + ALARM_WINDOW);
                self.emit(TimerEvent::AlarmStarted);
            }
            Err(e) => warn!("Alarm playback failed: {} ({})", e, e.suggestion()),
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Timer event receiver dropped");
        }
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("durations", &self.durations)
            .field("alarm_deadline", &self.alarm_deadline)
            .finish_non_exhaustive()
    }
}

impl DialTarget for TimerEngine {
    fn is_running(&self) -> bool {
        self.state.is_running
    }

    fn is_alarm_playing(&self) -> bool {
        self.state.is_alarm_playing
    }

    fn mode(&self) -> TimerMode {
        self.state.mode
    }

    fn time_left(&self) -> u32 {
        self.state.time_left_seconds
    }

    fn set_time_left(&mut self, seconds: u32) {
        TimerEngine::set_time_left(self, seconds);
    }

    fn stop_alarm(&mut self) {
        TimerEngine::stop_alarm(self);
    }

    fn durations(&self) -> DurationConfig {
        TimerEngine::durations(self)
    }

    fn set_durations(&mut self, config: DurationConfig) -> Result<(), DurationError> {
        TimerEngine::set_durations(self, config)
    }
}

// ============================================================================
// Tests
// ============================================================================
