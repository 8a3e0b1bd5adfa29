//! Doctor command: configuration and scorer diagnostics.

use std::time::Duration;

use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use submix_core::config::{self, Config, ConfigSources};
use submix_core::scoring::{DEFAULT_SCORER_URL, DEFAULT_TIMEOUT_SECS};
use submix_core::{RemoteBackend, ScoreStrategy};

use super::runtime;

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Skip the scorer connectivity check
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Reachable,
    Unreachable,
    Skipped,
}

#[derive(Debug, Serialize)]
struct ScorerCheck {
    strategy: ScoreStrategy,
    url: String,
    timeout_secs: u64,
    status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    version: &'static str,
    cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_config_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_limit_bytes: Option<u64>,
    scorer: ScorerCheck,
    issues: Vec<String>,
}

/// Diagnose configuration and scorer connectivity.
///
/// Problems are reported, not returned as errors.
#[instrument(name = "cmd_doctor", skip_all)]
pub fn cmd_doctor(
    args: DoctorArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(offline = args.offline, "executing doctor command");

    let url = config
        .scorer_url
        .clone()
        .unwrap_or_else(|| DEFAULT_SCORER_URL.to_string());
    let timeout_secs = config.scorer_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    let wants_check = !args.offline
        && (config.scorer == ScoreStrategy::Remote || config.scorer_url.is_some());

    let (status, error) = if wants_check {
        match check_scorer(&url, Duration::from_secs(timeout_secs)) {
            Ok(()) => (CheckStatus::Reachable, None),
            Err(e) => (CheckStatus::Unreachable, Some(e)),
        }
    } else {
        (CheckStatus::Skipped, None)
    };

    let mut issues = Vec::new();
    if config.scorer == ScoreStrategy::Remote && status == CheckStatus::Unreachable {
        issues.push(format!(
            "scorer at {url} is unreachable; every record will be scored locally"
        ));
    }
    if config.disable_input_limit {
        issues.push("input size limit is disabled".to_string());
    }

    let report = DoctorReport {
        version: env!("CARGO_PKG_VERSION"),
        cwd: cwd.to_string(),
        config_file: sources.primary_file().map(ToString::to_string),
        user_config_dir: config::user_config_dir().map(|p| p.to_string()),
        input_limit_bytes: submix_core::IngestOptions::from_config(config).max_input_bytes,
        scorer: ScorerCheck {
            strategy: config.scorer,
            url,
            timeout_secs,
            status,
            error,
        },
        issues,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn check_scorer(url: &str, timeout: Duration) -> Result<(), String> {
    let backend = RemoteBackend::new(url, timeout).map_err(|e| e.to_string())?;
    let rt = runtime().map_err(|e| e.to_string())?;
    rt.block_on(backend.ping()).map_err(|e| e.to_string())
}

fn print_report(report: &DoctorReport) {
    println!("{} {}", "submix doctor".bold(), report.version.green());
    println!("{}: {}", "Working directory".dimmed(), report.cwd);
    match report.config_file {
        Some(ref path) => println!("{}: {}", "Config file".dimmed(), path.cyan()),
        None => println!("{}: {}", "Config file".dimmed(), "none loaded".yellow()),
    }
    if let Some(ref dir) = report.user_config_dir {
        println!("{}: {}", "User config dir".dimmed(), dir);
    }
    match report.input_limit_bytes {
        Some(limit) => println!("{}: {} bytes", "Input limit".dimmed(), limit),
        None => println!("{}: {}", "Input limit".dimmed(), "disabled".yellow()),
    }

    println!();
    println!("{}", "Scorer".bold().underline());
    println!("{}: {}", "Strategy".dimmed(), report.scorer.strategy);
    println!("{}: {}", "URL".dimmed(), report.scorer.url);
    println!("{}: {}s", "Timeout".dimmed(), report.scorer.timeout_secs);
    let status = match report.scorer.status {
        CheckStatus::Reachable => "reachable".green().to_string(),
        CheckStatus::Unreachable => "unreachable".red().to_string(),
        CheckStatus::Skipped => "not checked".dimmed().to_string(),
    };
    println!("{}: {}", "Status".dimmed(), status);
    if let Some(ref e) = report.scorer.error {
        println!("{}: {}", "Error".dimmed(), e);
    }

    println!();
    if report.issues.is_empty() {
        println!("{}", "No issues found.".green());
    } else {
        for issue in &report.issues {
            println!("{} {}", "issue:".yellow(), issue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_doctor_succeeds() {
        let cwd = Utf8Path::new(".");
        let config = Config {
            scorer: ScoreStrategy::Remote,
            ..Config::default()
        };
        let args = DoctorArgs { offline: true };
        assert!(cmd_doctor(args, true, &config, &ConfigSources::default(), cwd).is_ok());
    }

    #[test]
    fn local_strategy_skips_scorer_check() {
        let cwd = Utf8Path::new(".");
        let args = DoctorArgs::default();
        assert!(cmd_doctor(args, false, &Config::default(), &ConfigSources::default(), cwd).is_ok());
    }

    #[test]
    fn unreachable_scorer_is_reported_as_error_text() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = check_scorer(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2))
            .unwrap_err();
        assert!(err.contains("unreachable") || err.contains("timed out"), "{err}");
    }
}
