//! Library interface for the `submix` CLI.
//!
//! Exposes the argument parser and command implementations so they can be
//! tested and used for documentation generation. The entry point is in
//! `main.rs`.
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//!
//! [`command()`] returns the clap `Command` that `xtask` turns into man
//! pages and shell completions.

pub mod commands;

#[cfg(feature = "mcp")]
pub mod server;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Set the global color mode. Call once at startup.
    pub fn apply(self) {
        match self {
            Self::Auto => {}
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                      Log filter (e.g., debug, submix_core=trace)
    SUBMIX_LOG_PATH               Explicit log file path
    SUBMIX_LOG_DIR                Log directory
    SUBMIX_SCORER                 Scoring strategy (local, remote)
    SUBMIX_SCORER_URL             Scorer service base URL
    SUBMIX_SCORER_TIMEOUT_SECS    Scorer request timeout
    SUBMIX_SCORE_CONCURRENCY      Records scored at once
";

/// Command-line interface definition for submix.
#[derive(Parser)]
#[command(name = "submix")]
#[command(about = "Compare, score, and ensemble tabular text submissions", long_about = None)]
#[command(version, arg_required_else_help = true)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print only the version number (for scripting)
    #[arg(long)]
    pub version_only: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis and build a best-of ensemble
    Analyze(commands::analyze::AnalyzeArgs),

    /// Word-count statistics per file
    Stats(commands::stats::StatsArgs),

    /// Compare two submission files row by row
    Compare(commands::compare::CompareArgs),

    /// Score a single text
    Score(commands::score::ScoreArgs),

    /// Diagnose configuration and scorer connectivity
    Doctor(commands::doctor::DoctorArgs),

    /// Show package information
    Info(commands::info::InfoArgs),

    /// Start MCP (Model Context Protocol) server on stdio
    #[cfg(feature = "mcp")]
    Serve(commands::serve::ServeArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
