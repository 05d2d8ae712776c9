//! Command-line argument parsing for Movie Feed
//!
//! This module defines the CLI structure using clap derive macros: browsing
//! the popular feed, showing a movie's detail, watching a live session and
//! managing the configuration file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::MovieId;

/// Movie Feed - Browse popular movies from the movie metadata API
#[derive(Parser, Debug)]
#[command(
    name = "movie_feed",
    version,
    about = "Browse the popular-movies feed of a movie metadata API",
    long_about = "Paginates the popular-movies feed, downloads poster thumbnails and shows movie detail.
Connectivity changes are watched so that failed fetches are retried when the network comes back."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and print pages of popular movies
    Popular(PopularArgs),

    /// Show a movie's cast and related titles
    Detail(DetailArgs),

    /// Run a browse session that retries on reconnect, until Ctrl+C
    Watch(WatchArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the popular command
#[derive(Args, Debug, Clone)]
pub struct PopularArgs {
    /// Number of pages to fetch
    #[arg(short, long, default_value = "1")]
    pub pages: u32,

    /// Download poster thumbnails of the fetched movies
    #[arg(short, long)]
    pub thumbnails: bool,
}

/// Arguments for the detail command
#[derive(Args, Debug, Clone)]
pub struct DetailArgs {
    /// Movie id
    #[arg(value_name = "ID")]
    pub id: MovieId,
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Pages to load when the session starts
    #[arg(short, long, default_value = "1")]
    pub pages: u32,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration (token redacted)
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level requested by flags, if any
    pub fn log_level_override(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl PopularArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.pages == 0 {
            return Err("Number of pages must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl WatchArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.pages == 0 {
            return Err("Number of pages must be greater than 0".to_string());
        }
        Ok(())
    }
}
