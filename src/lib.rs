//! Study Timer Library
//!
//! This library provides the core functionality for the study timer CLI.
//! It includes:
//! - Timer engine and the single-task service that drives its countdown
//! - Duration configuration with validation and persistence
//! - Rotary dial gesture handling
//! - Daily study statistics
//! - Alarm playback for completed countdowns
//! - Key-value persistence (JSON file or in-memory)
//! - CLI command parsing and display utilities

pub mod cli;
pub mod dial;
pub mod durations;
pub mod engine;
pub mod sound;
pub mod stats;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    DialIndicator, DurationConfig, TimerMode, TimerSnapshot, TimerState, MAX_MINUTES,
    MAX_SECONDS,
};

pub use engine::{TimerEngine, TimerEvent, TimerHandle, TimerService};

pub use durations::{DurationError, DurationStore};

pub use dial::{DialController, DialGeometry, DialTarget, Point};

pub use stats::{DailyStats, DailyStatsRecorder, MockStudyStats, StudyStats};

pub use storage::{FileStore, KeyValueStore, MemoryStore, SharedStore, StorageError};

pub use sound::{AlarmPlayer, MockAlarmPlayer, RodioAlarmPlayer, SilentAlarmPlayer, SoundError};
