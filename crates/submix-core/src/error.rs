//! Error types for submix-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while turning a file on disk into a [`Dataset`](crate::Dataset).
///
/// None of these reach the analysis pipeline: a file that fails ingestion is
/// reported to the caller and left out of the selection.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// The file that failed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is larger than the configured input limit.
    #[error("input too large: {path} is {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// The offending file.
        path: Utf8PathBuf,
        /// Size on disk.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// The delimited content could not be parsed.
    #[error("malformed table in {path}: {source}")]
    Parse {
        /// The file that failed.
        path: Utf8PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The header row lacks one or both required columns.
    #[error("{path} is missing required column(s): {missing}")]
    MissingColumns {
        /// The file that failed.
        path: Utf8PathBuf,
        /// Comma-separated list of missing column names.
        missing: String,
    },

    /// The file extension is not a supported tabular format.
    #[error("unsupported file type: {path} (expected .csv, .tsv or .tab)")]
    UnsupportedFormat {
        /// The offending file.
        path: Utf8PathBuf,
    },

    /// The submission glob pattern is invalid.
    #[error("invalid submission pattern {pattern:?}: {source}")]
    Pattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// Directory discovery found nothing to analyze.
    #[error("no submission files found under {dir}")]
    NoSubmissions {
        /// The directory that was searched.
        dir: Utf8PathBuf,
    },
}

/// Result type alias using [`IngestError`].
pub type IngestResult<T> = Result<T, IngestError>;

/// Failures of a remote scoring backend.
///
/// [`Scorer`](crate::scoring::Scorer) consumes these and falls back to the
/// local heuristic; they are only ever observed through the fallback hook.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// The request never completed (connection refused, DNS, TLS, ...).
    #[error("scoring backend unreachable: {0}")]
    Transport(String),

    /// The request exceeded the per-call timeout.
    #[error("scoring backend timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The backend answered with a non-success status.
    #[error("scoring backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The backend answered 2xx but the body was not a usable score.
    #[error("malformed scoring response: {0}")]
    Malformed(String),
}

/// Result type alias using [`ScoreError`].
pub type ScoreResult<T> = Result<T, ScoreError>;

/// Errors that stop an analysis run before it starts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    /// Analysis was triggered with an empty selection.
    #[error("no datasets selected for analysis")]
    NoSelection,

    /// Another analysis run is still in flight on the same analyzer.
    #[error("an analysis run is already in progress")]
    AlreadyRunning,
}

/// Result type alias using [`AnalysisError`].
pub type AnalysisResult<T> = Result<T, AnalysisError>;
