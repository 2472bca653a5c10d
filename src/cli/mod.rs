//! CLI module for the study timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `session`: Interactive foreground session

pub mod commands;
pub mod display;
pub mod session;

pub use commands::{Cli, Commands, DurationsCommand, SetDurationsArgs};
pub use display::Display;
pub use session::SessionCommand;
