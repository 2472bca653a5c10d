//! Interactive foreground session for `study-timer run`.
//!
//! Wires the timer service to the terminal: stdin lines become timer
//! commands, snapshots redraw the status line, and notable events are
//! printed above it.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use crate::dial::{normalize_angle, point_at_angle, DialController, DialGeometry, Point};
use crate::engine::{TimerEngine, TimerEvent, TimerHandle, TimerService};
use crate::sound::AlarmPlayer;
use crate::stats::StudyStats;
use crate::storage::SharedStore;
use crate::types::TimerMode;

use super::display::Display;

/// Dial used for `d <degrees>`: a 200x200 face anchored at the origin.
pub const CONSOLE_DIAL: DialGeometry = DialGeometry {
    center: Point { x: 100.0, y: 100.0 },
    radius: 100.0,
};

// ============================================================================
// Session Commands
// ============================================================================

/// A command typed into an interactive session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    Toggle,
    Reset,
    Switch(TimerMode),
    StopAlarm,
    /// Full drag gesture ending at this angle (degrees clockwise from 12,
    /// 360 wraps to 0)
    Dial(f64),
    Help,
    Quit,
}

impl SessionCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(None);
        };

        let command = match word {
            "t" | "toggle" => Self::Toggle,
            "r" | "reset" => Self::Reset,
            "w" | "work" => Self::Switch(TimerMode::Work),
            "s" | "short" => Self::Switch(TimerMode::ShortBreak),
            "l" | "long" => Self::Switch(TimerMode::LongBreak),
            "a" | "alarm" => Self::StopAlarm,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            "d" | "dial" => {
                let raw = parts
                    .next()
                    .ok_or_else(|| "usage: d <degrees>".to_string())?;
                let degrees: f64 = raw
                    .parse()
                    .map_err(|_| format!("not a number: {}", raw))?;
                if !degrees.is_finite() || !(0.0..=360.0).contains(&degrees) {
                    return Err(format!("angle must be between 0 and 360, got {}", raw));
                }
                Self::Dial(normalize_angle(degrees))
            }
            other => return Err(format!("unknown command: {} (h for help)", other)),
        };

        if parts.next().is_some() {
            return Err(format!("unexpected arguments after '{}'", word));
        }
        Ok(Some(command))
    }
}

/// Applies a command to the running service.
///
/// Returns false once the session should end.
pub async fn apply(handle: &TimerHandle, command: SessionCommand) -> Result<bool> {
    match command {
        SessionCommand::Toggle => {
            handle.toggle_running().await?;
        }
        SessionCommand::Reset => {
            handle.reset().await?;
        }
        SessionCommand::Switch(mode) => {
            handle.switch_mode(mode, false).await?;
        }
        SessionCommand::StopAlarm => {
            handle.stop_alarm().await?;
        }
        SessionCommand::Dial(degrees) => {
            let started = handle.dial_start().await?;
            if !started.dial.dragging {
                Display::show_error("stop the timer before adjusting the dial");
                return Ok(true);
            }
            handle
                .dial_move(point_at_angle(&CONSOLE_DIAL, degrees))
                .await?;
            handle.dial_end().await?;
        }
        SessionCommand::Help => Display::show_session_help(),
        SessionCommand::Quit => return Ok(false),
    }
    Ok(true)
}

// ============================================================================
// Session Loop
// ============================================================================

/// Runs an interactive session on stdin until `q`, EOF, or Ctrl-C.
pub async fn run(
    store: SharedStore,
    stats: Arc<dyn StudyStats>,
    alarm: Arc<dyn AlarmPlayer>,
) -> Result<()> {
    run_with_input(store, stats, alarm, spawn_stdin_reader()).await
}

/// Reads stdin lines on a detached thread.
///
/// A blocking read cannot be cancelled, so it must not live on the runtime:
/// the process would wait at exit for the user to press Enter.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("Stdin reader finished");
    });
    rx
}

/// Runs a session reading commands from `input` until it closes.
pub async fn run_with_input(
    store: SharedStore,
    stats: Arc<dyn StudyStats>,
    alarm: Arc<dyn AlarmPlayer>,
    input: mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine = TimerEngine::new(store, stats, alarm, event_tx);
    let (handle, join) = TimerService::spawn(engine, DialController::default());

    Display::show_session_help();
    let result = match handle.set_dial_geometry(CONSOLE_DIAL).await {
        Ok(_) => drive(&handle, event_rx, input).await,
        Err(e) => Err(e),
    };

    // Teardown runs even when the loop failed.
    if let Err(e) = handle.shutdown().await {
        debug!("Timer service already stopped: {}", e);
    }
    join.await.context("timer service task failed")?;
    println!();
    result
}

async fn drive(
    handle: &TimerHandle,
    mut events: mpsc::UnboundedReceiver<TimerEvent>,
    mut input: mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let mut snapshots = handle.subscribe();
    Display::render_status(&snapshots.borrow_and_update().clone());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    debug!("Input closed");
                    break;
                };
                match SessionCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if !apply(handle, command).await? {
                            break;
                        }
                        // published before the reply, so this is the result
                        Display::render_status(&snapshots.borrow_and_update().clone());
                    }
                    Ok(None) => {}
                    Err(message) => Display::show_error(&message),
                }
            }
            Some(event) = events.recv() => {
                if event.is_notice() {
                    Display::show_event(&event);
                    Display::render_status(&handle.current());
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                Display::render_status(&snapshot);
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
