//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use graft_core::config::DEFAULT_CONFIG_FILE;

pub mod check;
pub mod completions;
pub mod run;
mod utils;

/// Graft - replay commits between repositories that share no history.
#[derive(Debug, Parser)]
#[command(name = "graft", version, about, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay source commits missing from the destination onto a new branch.
    Run {
        /// Path to the config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Show what would be grafted without touching the destination.
        #[arg(long)]
        dry_run: bool,

        /// Override how many days of history are examined.
        #[arg(long, value_name = "DAYS")]
        lookback_days: Option<u32>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate the repository pair without walking history.
    Check {
        /// Path to the config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}
