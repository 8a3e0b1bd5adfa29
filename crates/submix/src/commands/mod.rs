//! Command implementations.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;

use submix_core::config::Config;
use submix_core::ingest::{self, DEFAULT_SUBMISSION_PATTERN, IngestOptions};
use submix_core::{Dataset, ScoreStrategy};

pub mod analyze;
pub mod compare;
pub mod doctor;
pub mod info;
pub mod score;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod stats;

/// Scorer flags shared by commands that score text.
#[derive(Args, Debug, Default, Clone)]
pub struct ScorerArgs {
    /// Scoring strategy (overrides config)
    #[arg(long, value_enum)]
    pub scorer: Option<ScoreStrategy>,

    /// Scorer service base URL; implies `--scorer remote` unless set
    #[arg(long, value_name = "URL")]
    pub scorer_url: Option<String>,

    /// Scorer request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ScorerArgs {
    /// Fold these flags over the loaded configuration.
    pub fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(ref url) = self.scorer_url {
            config.scorer_url = Some(url.clone());
            config.scorer = ScoreStrategy::Remote;
        }
        if let Some(strategy) = self.scorer {
            config.scorer = strategy;
        }
        if self.timeout.is_some() {
            config.scorer_timeout_secs = self.timeout;
        }
        config
    }
}

/// Resolve `inputs` (files or directories) and load them.
///
/// Rejected files are reported on stderr and left out. The result may be
/// empty; callers decide whether that is an error.
pub fn load_submissions(inputs: &[Utf8PathBuf], config: &Config) -> anyhow::Result<Vec<Dataset>> {
    let pattern = config
        .submission_pattern
        .as_deref()
        .unwrap_or(DEFAULT_SUBMISSION_PATTERN);
    let files = ingest::resolve_inputs(inputs, pattern).context("failed to resolve inputs")?;
    let outcome = ingest::load_datasets(&files, &IngestOptions::from_config(config));
    for rejected in &outcome.rejected {
        eprintln!("{} skipped {}: {}", "warning:".yellow(), rejected.path, rejected.error);
    }
    Ok(outcome.datasets)
}

/// Multi-threaded runtime for commands that score text.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to create async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scorer_url_implies_remote() {
        let args = ScorerArgs {
            scorer_url: Some("http://scorer:5000".into()),
            ..ScorerArgs::default()
        };
        let config = args.apply(&Config::default());
        assert_eq!(config.scorer, ScoreStrategy::Remote);
        assert_eq!(config.scorer_url.as_deref(), Some("http://scorer:5000"));
    }

    #[test]
    fn explicit_strategy_wins_over_url() {
        let args = ScorerArgs {
            scorer: Some(ScoreStrategy::Local),
            scorer_url: Some("http://scorer:5000".into()),
            timeout: Some(3),
        };
        let config = args.apply(&Config::default());
        assert_eq!(config.scorer, ScoreStrategy::Local);
        assert_eq!(config.scorer_timeout_secs, Some(3));
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let base = Config {
            scorer: ScoreStrategy::Remote,
            scorer_timeout_secs: Some(9),
            ..Config::default()
        };
        assert_eq!(ScorerArgs::default().apply(&base), base);
    }
}
