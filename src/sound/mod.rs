//! Alarm playback for the study timer.
//!
//! This module provides the audible cue played when a countdown completes:
//!
//! - A synthesized beep sequence (no audio files needed)
//! - Non-blocking playback on a dedicated audio thread
//! - Early stop when the user dismisses the alarm
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   crossbeam    ┌──────────────────┐
//! │ RodioAlarmPlayer │──────────────▶│   audio thread   │
//! │  (Send + Sync)   │  Play / Stop   │ OutputStream+Sink│
//! └──────────────────┘                └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use study_timer::sound::{AlarmPlayer, RodioAlarmPlayer, ToneSequence};
//!
//! let player = RodioAlarmPlayer::new(ToneSequence::default()).expect("audio init");
//! player.play().expect("playback failed");
//! player.stop();
//! ```

mod error;
mod player;
mod tone;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub use error::SoundError;
pub use player::{try_create_player, RodioAlarmPlayer};
pub use tone::ToneSequence;

/// Trait for alarm playback implementations.
///
/// This trait abstracts alarm playback, allowing for different
/// implementations (rodio-based, silent, mock for testing).
pub trait AlarmPlayer: Send + Sync {
    /// Starts the alarm tone.
    ///
    /// This method should be non-blocking; the tone plays in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if playback cannot be started.
    fn play(&self) -> Result<(), SoundError>;

    /// Stops the alarm tone. Safe to call when nothing is playing.
    fn stop(&self);
}

impl AlarmPlayer for RodioAlarmPlayer {
    fn play(&self) -> Result<(), SoundError> {
        RodioAlarmPlayer::play(self)
    }

    fn stop(&self) {
        RodioAlarmPlayer::stop(self)
    }
}

/// Player used when sound is disabled or no device is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlarmPlayer;

impl AlarmPlayer for SilentAlarmPlayer {
    fn play(&self) -> Result<(), SoundError> {
        Ok(())
    }

    fn stop(&self) {}
}

/// Mock alarm player for testing.
#[derive(Debug, Default)]
pub struct MockAlarmPlayer {
    play_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    playing: AtomicBool,
    should_fail: AtomicBool,
}

impl MockAlarmPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `play` fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// True between a successful `play` and the next `stop`.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl AlarmPlayer for MockAlarmPlayer {
    fn play(&self) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::DeviceNotAvailable("Mock failure".to_string()));
        }
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }
}
