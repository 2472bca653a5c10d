//! Discrete timer events for observers (display, logging, tests).

use crate::types::{DurationConfig, TimerMode};

/// Timer events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started {
        /// Mode being counted down
        mode: TimerMode,
    },
    /// Countdown stopped by the user
    Stopped {
        /// Seconds left when stopped
        time_left_seconds: u32,
    },
    /// Countdown reset to the mode's configured duration
    Reset {
        /// Mode that was reset
        mode: TimerMode,
    },
    /// Active mode changed
    ModeSwitched {
        /// Previous mode
        from: TimerMode,
        /// New mode
        to: TimerMode,
    },
    /// User-facing notice for a mode change
    Announcement {
        /// Mode being entered
        mode: TimerMode,
        /// Message to show
        message: String,
    },
    /// One second elapsed
    Tick {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// A work countdown reached zero
    WorkCompleted {
        /// Completed work sessions including this one
        completed_sessions: u32,
        /// Minutes reported to the study statistics
        study_minutes: u32,
    },
    /// A break countdown reached zero
    BreakCompleted {
        /// Which break ended
        mode: TimerMode,
    },
    /// Completion alarm started sounding
    AlarmStarted,
    /// Completion alarm dismissed or expired
    AlarmStopped,
    /// Configured durations replaced
    DurationsChanged(DurationConfig),
}

impl TimerEvent {
    /// Returns true for events worth showing to the user as a notice.
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            TimerEvent::Announcement { .. }
                | TimerEvent::WorkCompleted { .. }
                | TimerEvent::BreakCompleted { .. }
                | TimerEvent::DurationsChanged(_)
        )
    }
}
