//! Tracing subscriber setup.
//!
//! Events go to stderr in a compact human format, so stdout stays clean for
//! `--json` output. When a log file is configured, the same events are also
//! written there as JSON lines through a non-blocking appender.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Explicit log file path.
const LOG_PATH_ENV: &str = "SUBMIX_LOG_PATH";
/// Directory for the default log file name.
const LOG_DIR_ENV: &str = "SUBMIX_LOG_DIR";
const LOG_FILE_NAME: &str = "submix.jsonl";

/// Where (if anywhere) to write the JSONL log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Log file; `None` disables file logging.
    pub log_file: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve the log file from the environment, then `log_dir`.
    ///
    /// `SUBMIX_LOG_PATH` wins, then `SUBMIX_LOG_DIR`, then the configured
    /// directory. With none of them set, nothing is written to disk.
    pub fn from_env_with_overrides(log_dir: Option<PathBuf>) -> Self {
        Self::resolve(
            std::env::var_os(LOG_PATH_ENV),
            std::env::var_os(LOG_DIR_ENV),
            log_dir,
        )
    }

    fn resolve(path: Option<OsString>, env_dir: Option<OsString>, log_dir: Option<PathBuf>) -> Self {
        let non_empty = |v: OsString| (!v.is_empty()).then(|| PathBuf::from(v));
        let log_file = path.and_then(non_empty).or_else(|| {
            env_dir
                .and_then(non_empty)
                .or(log_dir)
                .map(|dir| dir.join(LOG_FILE_NAME))
        });
        Self { log_file }
    }
}

/// Levels from quietest to loudest.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Level directive for the given flags.
///
/// `-q` beats `-v`; otherwise each `-v` raises the level one step above the
/// configured one, stopping at `trace`. An unrecognised configured level is
/// treated as `info`.
fn level_directive(quiet: bool, verbose: u8, configured: &str) -> &'static str {
    if quiet {
        return LEVELS[0];
    }
    let base = LEVELS
        .iter()
        .position(|l| l.eq_ignore_ascii_case(configured))
        .unwrap_or(2);
    LEVELS[(base + usize::from(verbose)).min(LEVELS.len() - 1)]
}

/// Build the filter. `RUST_LOG`, when set and valid, overrides the flags.
pub fn env_filter(quiet: bool, verbose: u8, configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(quiet, verbose, configured)))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the file
/// writer.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let Some(ref path) = config.log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let file_layer = fmt::layer().json().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(Some(guard))
}
