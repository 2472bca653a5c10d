//! Core data types for the study timer.
//!
//! This module defines the data structures used for:
//! - Timer modes and their nominal durations
//! - Duration configuration with validation
//! - Timer state and the snapshot published to observers

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Largest value the dial can represent, in minutes.
pub const MAX_MINUTES: u32 = 60;

/// Upper bound of `time_left_seconds` and of any configured duration.
pub const MAX_SECONDS: u32 = MAX_MINUTES * 60;

/// Lower bound of any configured duration.
pub const MIN_DURATION_SECONDS: u32 = 60;

/// Number of work sessions per cycle; every Nth completion earns a long break.
pub const SESSIONS_PER_LONG_BREAK: u32 = 4;

// ============================================================================
// TimerMode
// ============================================================================

/// The three countdown categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Focus session
    #[default]
    Work,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break after a full cycle
    LongBreak,
}

impl TimerMode {
    /// All modes in display order.
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::ShortBreak, TimerMode::LongBreak];

    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Work => "Focus",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    /// Returns true for the two break modes.
    pub fn is_break(&self) -> bool {
        !matches!(self, TimerMode::Work)
    }

    /// Message announced when the timer switches into this mode.
    pub fn announcement(&self) -> &'static str {
        match self {
            TimerMode::Work => "Break is over. Time to focus!",
            TimerMode::ShortBreak => "Work session complete! Take a short break.",
            TimerMode::LongBreak => "Great job! You've earned a long break.",
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// DurationConfig
// ============================================================================

/// Nominal duration of each mode, in seconds.
///
/// The serialized field names match the persisted format
/// (`{"work":1500,"short":300,"long":900}`). Deserialization only checks
/// shape and integrality; bounds are checked by [`DurationConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationConfig {
    /// Work duration in seconds (60-3600)
    pub work: u32,
    /// Short break duration in seconds (60-3600)
    pub short: u32,
    /// Long break duration in seconds (60-3600)
    pub long: u32,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            work: 1500,
            short: 300,
            long: 900,
        }
    }
}

impl DurationConfig {
    /// Returns the duration of `mode` in seconds.
    pub fn get(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work,
            TimerMode::ShortBreak => self.short,
            TimerMode::LongBreak => self.long,
        }
    }

    /// Returns a copy with `mode` replaced and the other two entries unchanged.
    #[must_use]
    pub fn with(mut self, mode: TimerMode, seconds: u32) -> Self {
        match mode {
            TimerMode::Work => self.work = seconds,
            TimerMode::ShortBreak => self.short = seconds,
            TimerMode::LongBreak => self.long = seconds,
        }
        self
    }

    /// Validates the configuration.
    ///
    /// Returns the first mode whose duration is out of bounds.
    pub fn validate(&self) -> Result<(), (TimerMode, u32)> {
        for mode in TimerMode::ALL {
            let seconds = self.get(mode);
            if !is_valid_duration(seconds) {
                return Err((mode, seconds));
            }
        }
        Ok(())
    }

    /// Returns true if every entry is within bounds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Returns true if `seconds` is a legal configured duration.
pub fn is_valid_duration(seconds: u32) -> bool {
    (MIN_DURATION_SECONDS..=MAX_SECONDS).contains(&seconds)
}

/// Clamps `seconds` into the legal duration range.
pub fn clamp_duration(seconds: u32) -> u32 {
    seconds.clamp(MIN_DURATION_SECONDS, MAX_SECONDS)
}

// ============================================================================
// TimerState
// ============================================================================

/// Authoritative countdown state, owned by the timer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    /// Current mode
    pub mode: TimerMode,
    /// Seconds remaining in the current countdown (0-3600)
    pub time_left_seconds: u32,
    /// Whether the one-second tick loop is active
    pub is_running: bool,
    /// Whether the completion alarm is sounding
    pub is_alarm_playing: bool,
    /// Completed work countdowns, persisted
    pub completed_sessions: u32,
    /// Cumulative work minutes, persisted, accumulated 1/60 per tick
    pub total_focus_minutes: f64,
}

impl TimerState {
    /// Creates the initial state: Work, stopped, alarm off.
    pub fn new(work_seconds: u32, completed_sessions: u32, total_focus_minutes: f64) -> Self {
        Self {
            mode: TimerMode::Work,
            time_left_seconds: work_seconds.min(MAX_SECONDS),
            is_running: false,
            is_alarm_playing: false,
            completed_sessions,
            total_focus_minutes,
        }
    }

    /// Returns true if the tick loop should be active.
    pub fn is_counting_down(&self) -> bool {
        self.is_running && self.time_left_seconds > 0
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DurationConfig::default().work, 0, 0.0)
    }
}

// ============================================================================
// Dial indicator and snapshot
// ============================================================================

/// Angular position of the dial indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DialIndicator {
    /// Clockwise angle from 12 o'clock, in degrees `[0, 360]`
    pub angle_degrees: f64,
    /// Whether a drag gesture is driving the indicator
    pub dragging: bool,
    /// Whether the presentation layer should animate towards the angle
    pub animated: bool,
}

/// Everything an observer needs to render the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Countdown state
    pub timer: TimerState,
    /// Configured durations
    pub durations: DurationConfig,
    /// Dial indicator position
    pub dial: DialIndicator,
}

// ============================================================================
// Tests
// ============================================================================
