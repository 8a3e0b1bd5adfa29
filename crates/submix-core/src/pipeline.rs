//! The analysis run: statistics, comparison, scoring, histograms, best-of.
//!
//! [`Analyzer::run`] takes an immutable selection of datasets and a
//! [`Scorer`] and returns a fresh [`AnalysisReport`]. Nothing is cached
//! between runs. Only one run may be in flight per analyzer; a second call
//! made while the first is still scoring is refused with
//! [`AnalysisError::AlreadyRunning`].

use std::sync::atomic::{AtomicBool, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::best_of::{self, BestRecord};
use crate::compare::{self, ComparisonResult};
use crate::dataset::Dataset;
use crate::ensemble::{self, EnsembleSummary};
use crate::error::{AnalysisError, AnalysisResult};
use crate::perplexity::{PerplexityReport, ScoredRecord};
use crate::scoring::{ScoreStrategy, Scorer};
use crate::stats::{self, FileStats};

/// How the run's scores were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScoringSummary {
    /// Strategy the scorer was configured with.
    pub strategy: ScoreStrategy,
    /// Records scored locally because the remote backend failed.
    pub fallback_count: usize,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    /// Word-count statistics, one per dataset.
    pub file_stats: Vec<FileStats>,
    /// Comparison of the first two datasets; absent with fewer than two.
    pub comparison: Option<ComparisonResult>,
    /// Ids present in every dataset.
    pub common_id_count: usize,
    /// Distinct ids across all datasets.
    pub total_unique_id_count: usize,
    /// Scores and histogram, one per dataset.
    pub perplexity_reports: Vec<PerplexityReport>,
    /// Lowest-score record per id.
    pub best_records: Vec<BestRecord>,
    /// Contribution of each dataset to `best_records`.
    pub ensemble: EnsembleSummary,
    /// Scoring strategy and fallback tally.
    pub scoring: ScoringSummary,
}

/// Runs analyses one at a time.
#[derive(Debug, Default)]
pub struct Analyzer {
    running: AtomicBool,
}

/// Clears the in-flight flag when dropped, including on early return.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> AnalysisResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AnalysisError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Analyzer {
    /// Create an idle analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Analyze `datasets` with `scorer`.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::NoSelection`] when `datasets` is empty,
    /// [`AnalysisError::AlreadyRunning`] when another run is in flight.
    /// Scoring failures are never errors; they fall back per record.
    #[tracing::instrument(skip_all, fields(datasets = datasets.len(), strategy = %scorer.strategy()))]
    pub async fn run(&self, datasets: &[Dataset], scorer: &Scorer) -> AnalysisResult<AnalysisReport> {
        if datasets.is_empty() {
            return Err(AnalysisError::NoSelection);
        }
        let _guard = RunGuard::acquire(&self.running)?;
        tracing::info!(
            records = datasets.iter().map(Dataset::len).sum::<usize>(),
            "analysis started"
        );

        let file_stats: Vec<FileStats> = datasets.iter().map(stats::compute_file_stats).collect();
        let comparison = match datasets {
            [first, second, ..] => Some(compare::compare_datasets(first, second)),
            _ => None,
        };
        let common_id_count = compare::common_id_count(datasets);
        let total_unique_id_count = compare::total_unique_id_count(datasets);

        let perplexity_reports = score_datasets(datasets, scorer).await;
        let best_records = best_of::select_best_records(&perplexity_reports);
        let names: Vec<&str> = datasets.iter().map(Dataset::name).collect();
        let ensemble = ensemble::summarize(&best_records, &names);
        let fallback_count = perplexity_reports
            .iter()
            .map(PerplexityReport::fallback_count)
            .sum();

        tracing::info!(
            common_id_count,
            total_unique_id_count,
            best = best_records.len(),
            fallback_count,
            "analysis complete"
        );

        Ok(AnalysisReport {
            file_stats,
            comparison,
            common_id_count,
            total_unique_id_count,
            perplexity_reports,
            best_records,
            ensemble,
            scoring: ScoringSummary {
                strategy: scorer.strategy(),
                fallback_count,
            },
        })
    }
}

/// Score every record of every dataset through one bounded stream.
async fn score_datasets(datasets: &[Dataset], scorer: &Scorer) -> Vec<PerplexityReport> {
    let texts: Vec<&str> = datasets
        .iter()
        .flat_map(|d| d.records().iter().map(|r| r.text.as_str()))
        .collect();
    let mut results = scorer.score_all(&texts).await.into_iter();

    datasets
        .iter()
        .map(|dataset| {
            let scores: Vec<ScoredRecord> = dataset
                .records()
                .iter()
                .zip(results.by_ref())
                .map(|(record, (score, source))| ScoredRecord {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    score,
                    source,
                })
                .collect();
            tracing::debug!(dataset = dataset.name(), scored = scores.len(), "dataset scored");
            PerplexityReport::new(dataset.name(), scores)
        })
        .collect()
}

/// One-shot convenience over [`Analyzer::run`].
pub async fn analyze(datasets: &[Dataset], scorer: &Scorer) -> AnalysisResult<AnalysisReport> {
    Analyzer::new().run(datasets, scorer).await
}
