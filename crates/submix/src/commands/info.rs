//! Info command implementation

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use submix_core::config::{Config, ConfigSources};
use submix_core::ingest::{DEFAULT_SUBMISSION_PATTERN, IngestOptions};
use submix_core::scoring::{DEFAULT_CONCURRENCY, DEFAULT_SCORER_URL, DEFAULT_TIMEOUT_SECS};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

/// Effective settings, with defaults filled in.
#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    scorer: String,
    scorer_url: String,
    scorer_timeout_secs: u64,
    score_concurrency: usize,
    id_column: String,
    text_column: String,
    submission_pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_input_bytes: Option<u64>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let ingest = IngestOptions::from_config(config);
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            scorer: config.scorer.as_str().to_string(),
            scorer_url: config
                .scorer_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SCORER_URL.to_string()),
            scorer_timeout_secs: config.scorer_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            score_concurrency: config.score_concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            id_column: ingest.id_column,
            text_column: ingest.text_column,
            submission_pattern: config
                .submission_pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBMISSION_PATTERN.to_string()),
            max_input_bytes: ingest.max_input_bytes,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information and effective configuration.
#[instrument(name = "cmd_info", skip_all)]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, sources),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full)?);
        return Ok(());
    }

    println!("{} {}", full.package.name.bold(), full.package.version.green());
    if !full.package.description.is_empty() {
        println!("{}", full.package.description);
    }
    if !full.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full.package.license);
    }
    if !full.package.repository.is_empty() {
        println!("{}: {}", "Repository".dimmed(), full.package.repository.cyan());
    }

    let c = &full.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    match c.config_file {
        Some(ref path) => println!("{}: {}", "Config file".dimmed(), path.cyan()),
        None => println!("{}: {}", "Config file".dimmed(), "none loaded".yellow()),
    }
    println!("{}: {}", "Log level".dimmed(), c.log_level);
    if let Some(ref dir) = c.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }

    println!();
    println!("{}", "Scoring".bold().underline());
    println!("{}: {}", "Strategy".dimmed(), c.scorer);
    println!("{}: {}", "Scorer URL".dimmed(), c.scorer_url);
    println!("{}: {}s", "Timeout".dimmed(), c.scorer_timeout_secs);
    println!("{}: {}", "Concurrency".dimmed(), c.score_concurrency);

    println!();
    println!("{}", "Input".bold().underline());
    println!("{}: {} / {}", "Columns".dimmed(), c.id_column, c.text_column);
    println!("{}: {}", "Discovery glob".dimmed(), c.submission_pattern);
    match c.max_input_bytes {
        Some(limit) => println!("{}: {} bytes", "Size limit".dimmed(), limit),
        None => println!("{}: {}", "Size limit".dimmed(), "(disabled)".dimmed()),
    }

    Ok(())
}
