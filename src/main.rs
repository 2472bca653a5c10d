//! Study Timer CLI - a Pomodoro timer for the terminal
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4 focus sessions

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use study_timer::cli::{session, Cli, Commands, Display, DurationsCommand, SetDurationsArgs};
use study_timer::engine::persisted_counters;
use study_timer::sound::{try_create_player, AlarmPlayer, SilentAlarmPlayer};
use study_timer::stats::{DailyStatsRecorder, StudyStats};
use study_timer::storage::{clear_all, FileStore, SharedStore};
use study_timer::{DurationConfig, DurationStore};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }
    let data_dir = cli.resolve_data_dir();

    match cli.command {
        Some(Commands::Run) => {
            let store = open_store(data_dir)?;
            let stats: Arc<dyn StudyStats> = Arc::new(DailyStatsRecorder::new(store.clone()));
            let alarm = create_alarm(cli.no_sound);
            session::run(store, stats, alarm).await?;
        }
        Some(Commands::Durations(DurationsCommand::Show)) => {
            let store = open_store(data_dir)?;
            Display::show_durations(&DurationStore::load(store).get());
        }
        Some(Commands::Durations(DurationsCommand::Set(args))) => {
            let mut durations = DurationStore::load(open_store(data_dir)?);
            if !args.is_empty() {
                durations.set(merge_durations(durations.get(), &args))?;
            }
            Display::show_durations(&durations.get());
        }
        Some(Commands::Stats) => {
            let store = open_store(data_dir)?;
            let (completed_sessions, total_focus_minutes) = persisted_counters(store.as_ref());
            let recorder = DailyStatsRecorder::new(store);
            Display::show_stats(
                completed_sessions,
                total_focus_minutes,
                &recorder.today(),
                &recorder.all(),
            );
        }
        Some(Commands::Clear) => {
            let store = open_store(data_dir)?;
            clear_all(store.as_ref()).context("failed to clear timer data")?;
            Display::show_clear_success();
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Opens the file store in the data directory.
fn open_store(data_dir: Option<PathBuf>) -> Result<SharedStore> {
    let dir = data_dir.context("could not determine a data directory, pass --data-dir")?;
    let store = FileStore::open_in_dir(&dir)
        .with_context(|| format!("failed to open timer data in {}", dir.display()))?;
    tracing::debug!("Using storage file {}", store.path().display());
    Ok(Arc::new(store))
}

/// Picks the alarm player, falling back to silence without an audio device.
fn create_alarm(no_sound: bool) -> Arc<dyn AlarmPlayer> {
    if no_sound {
        return Arc::new(SilentAlarmPlayer);
    }
    match try_create_player() {
        Some(player) => player as Arc<dyn AlarmPlayer>,
        None => Arc::new(SilentAlarmPlayer),
    }
}

/// Applies `durations set` minutes on top of the current configuration.
fn merge_durations(current: DurationConfig, args: &SetDurationsArgs) -> DurationConfig {
    DurationConfig {
        work: args.work.map_or(current.work, |minutes| minutes * 60),
        short: args.short.map_or(current.short, |minutes| minutes * 60),
        long: args.long.map_or(current.long, |minutes| minutes * 60),
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
