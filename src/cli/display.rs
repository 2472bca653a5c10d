//! Display utilities for the study timer CLI.
//!
//! This module provides formatted output for:
//! - The live status line of an interactive session
//! - Timer events worth telling the user about
//! - Configured durations and study statistics
//! - Error messages

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;

use crate::engine::TimerEvent;
use crate::stats::DailyStats;
use crate::types::{DurationConfig, TimerMode, TimerSnapshot};

/// Carriage return plus ANSI erase-line.
const CLEAR_LINE: &str = "\r\x1b[2K";

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Formats remaining seconds as (minutes, seconds).
    pub fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }

    /// Formats remaining seconds as `mm:ss`.
    pub fn format_clock(total_seconds: u32) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// One-line summary of a snapshot.
    pub fn status_line(snapshot: &TimerSnapshot) -> String {
        let timer = &snapshot.timer;
        let state = if snapshot.dial.dragging {
            "adjusting"
        } else if timer.is_running {
            "running"
        } else {
            "stopped"
        };

        let mut line = format!(
            "[{}] {} {} | sessions: {} | focus: {:.1} min",
            timer.mode.label(),
            Self::format_clock(timer.time_left_seconds),
            state,
            timer.completed_sessions,
            timer.total_focus_minutes,
        );
        if timer.is_alarm_playing {
            line.push_str(" | ALARM");
        }
        line
    }

    /// Prints the status line.
    pub fn show_status(snapshot: &TimerSnapshot) {
        println!("{}", Self::status_line(snapshot));
    }

    /// Redraws the status line in place.
    pub fn render_status(snapshot: &TimerSnapshot) {
        print!("{}{}", CLEAR_LINE, Self::status_line(snapshot));
        let _ = std::io::stdout().flush();
    }

    /// Message for events worth printing; `None` for the rest.
    pub fn event_message(event: &TimerEvent) -> Option<String> {
        match event {
            TimerEvent::Announcement { message, .. } => Some(format!("* {}", message)),
            TimerEvent::WorkCompleted {
                completed_sessions,
                study_minutes,
            } => Some(format!(
                "* Session #{} complete ({} min studied)",
                completed_sessions, study_minutes
            )),
            TimerEvent::BreakCompleted { mode } => Some(format!("* {} finished", mode.label())),
            TimerEvent::DurationsChanged(config) => Some(format!(
                "* Durations updated: {}",
                Self::durations_summary(config)
            )),
            _ => None,
        }
    }

    /// Prints an event if it has a message.
    pub fn show_event(event: &TimerEvent) {
        if let Some(message) = Self::event_message(event) {
            println!("{}{}", CLEAR_LINE, message);
        }
    }

    /// Compact single-line form of a duration configuration.
    pub fn durations_summary(config: &DurationConfig) -> String {
        TimerMode::ALL
            .iter()
            .map(|mode| format!("{} {}", mode.label(), Self::format_clock(config.get(*mode))))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Prints the configured durations.
    pub fn show_durations(config: &DurationConfig) {
        println!("Durations");
        println!("─────────────────────────────");
        for mode in TimerMode::ALL {
            println!(
                "{:<12} {}",
                format!("{}:", mode.label()),
                Self::format_clock(config.get(mode))
            );
        }
    }

    /// Prints lifetime counters, today's record, and per-day history.
    pub fn show_stats(
        completed_sessions: u32,
        total_focus_minutes: f64,
        today: &DailyStats,
        history: &BTreeMap<NaiveDate, DailyStats>,
    ) {
        println!("Study statistics");
        println!("─────────────────────────────");
        println!("Completed sessions: {}", completed_sessions);
        println!("Total focus:        {:.1} min", total_focus_minutes);
        println!(
            "Today:              {} min, {} sessions",
            today.study_minutes, today.focus_sessions
        );

        if !history.is_empty() {
            println!();
            for (date, day) in history.iter().rev() {
                println!(
                    "{}  {:>4} min  {:>3} sessions",
                    date, day.study_minutes, day.focus_sessions
                );
            }
        }
    }

    /// Prints the interactive command reference.
    pub fn show_session_help() {
        println!("Commands:");
        println!("  t        start / stop");
        println!("  r        reset");
        println!("  w s l    switch to focus / short break / long break");
        println!("  a        stop alarm");
        println!("  d <deg>  set the dial to an angle (0-360)");
        println!("  q        quit");
    }

    /// Shows a success message for clearing persisted data.
    pub fn show_clear_success() {
        println!("* Cleared all timer data");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }
}

// ============================================================================
// Tests
// ============================================================================
