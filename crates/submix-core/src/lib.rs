//! Core library for submix.
//!
//! Loads tabular text submissions, compares them, scores every record and
//! assembles a best-of ensemble. The `submix` CLI and MCP server are thin
//! layers over this crate.
//!
//! # Modules
//!
//! - [`ingest`] - Reading submission files into [`Dataset`]s
//! - [`stats`], [`compare`] - Word-count statistics and cross-file comparison
//! - [`scoring`] - Remote scorer with local fallback
//! - [`perplexity`], [`histogram`] - Per-dataset score reports
//! - [`best_of`], [`ensemble`] - Lowest-score selection and its summary
//! - [`pipeline`] - One full analysis run
//! - [`config`], [`error`] - Configuration and error types
//!
//! # Quick Start
//!
//! ```no_run
//! use submix_core::{ConfigLoader, IngestOptions, Scorer, analyze, ingest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, _) = ConfigLoader::new().load()?;
//! let options = IngestOptions::from_config(&config);
//! let outcome = ingest::load_datasets(&["a_submission.csv", "b_submission.csv"], &options);
//! let report = analyze(&outcome.datasets, &Scorer::from_config(&config)).await?;
//! println!("{} best records", report.best_records.len());
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod best_of;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod ensemble;
pub mod error;
pub mod histogram;
pub mod ingest;
pub mod perplexity;
pub mod pipeline;
pub mod scoring;
pub mod stats;
pub mod text;

pub use best_of::{BestRecord, select_best_records};
pub use compare::{ComparisonResult, ComparisonRow, compare_datasets};
pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use dataset::{Dataset, Record, RecordId};
pub use ensemble::{EnsembleSummary, SourceContribution};
pub use error::{
    AnalysisError, AnalysisResult, ConfigError, ConfigResult, IngestError, IngestResult,
    ScoreError, ScoreResult,
};
pub use histogram::{Bucket, build_histogram};
pub use ingest::{IngestOptions, LoadOutcome};
pub use perplexity::{PerplexityReport, ScoredRecord};
pub use pipeline::{AnalysisReport, Analyzer, analyze};
pub use scoring::{RemoteBackend, ScoreBackend, ScoreSource, ScoreStrategy, Scorer};
pub use stats::{FileStats, compute_file_stats};

/// Default cap on a submission file's size (50 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;
