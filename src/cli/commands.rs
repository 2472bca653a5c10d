//! Command definitions for the study timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Study timer - a Pomodoro countdown with a rotary dial
#[derive(Parser, Debug)]
#[command(
    name = "study-timer",
    version,
    about = "Pomodoro study timer for the terminal",
    long_about = "A Pomodoro study timer: focus sessions, short and long breaks,\n\
                  a completion alarm, and daily study statistics.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the persisted timer data
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Disable the completion alarm sound
    #[arg(long, global = true)]
    pub no_sound: bool,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolves the data directory, falling back to the platform data dir.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("study-timer")))
    }
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an interactive timer session in the foreground
    Run,

    /// Show or change the configured durations
    #[command(subcommand)]
    Durations(DurationsCommand),

    /// Show completed sessions and study statistics
    Stats,

    /// Remove all persisted timer data
    Clear,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// `durations` subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DurationsCommand {
    /// Print the configured durations
    Show,

    /// Change one or more durations
    Set(SetDurationsArgs),
}

// ============================================================================
// Durations Arguments
// ============================================================================

/// Arguments for `durations set`. Omitted values keep their current setting.
#[derive(Args, Debug, Clone, Default)]
pub struct SetDurationsArgs {
    /// Focus duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub work: Option<u32>,

    /// Short break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub short: Option<u32>,

    /// Long break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub long: Option<u32>,
}

impl SetDurationsArgs {
    /// Returns true if no duration was given.
    pub fn is_empty(&self) -> bool {
        self.work.is_none() && self.short.is_none() && self.long.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================
