//! Command-line interface components
//!
//! This module contains CLI-specific code for the Movie Feed application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DetailArgs, GlobalArgs, PopularArgs, WatchArgs,
};
pub use commands::{handle_config, handle_detail, handle_popular, handle_watch};
pub use progress::{ProgressConfig, ThumbnailProgress, ThumbnailSummary};
