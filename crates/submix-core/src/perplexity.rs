//! Per-dataset score reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::RecordId;
use crate::histogram::{self, Bucket};
use crate::scoring::ScoreSource;

/// A record with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredRecord {
    /// Record id.
    pub id: RecordId,
    /// Record text.
    pub text: String,
    /// Score; lower is better.
    pub score: f64,
    /// Which scoring path produced `score`.
    pub source: ScoreSource,
}

/// Scores, summary and histogram for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerplexityReport {
    /// Dataset display name.
    pub name: String,
    /// Mean score; `0` when there are no records.
    pub avg_score: f64,
    /// Lowest score; `0` when there are no records.
    pub min_score: f64,
    /// Highest score; `0` when there are no records.
    pub max_score: f64,
    /// One entry per record, in record order.
    pub scores: Vec<ScoredRecord>,
    /// Ten-bucket distribution of `scores`.
    pub histogram: Vec<Bucket>,
}

impl PerplexityReport {
    /// Summarize scored records for the dataset called `name`.
    pub fn new(name: impl Into<String>, scores: Vec<ScoredRecord>) -> Self {
        let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
        let (avg_score, min_score, max_score) = if values.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                values.iter().sum::<f64>() / values.len() as f64,
                values.iter().copied().fold(f64::INFINITY, f64::min),
                values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };
        Self {
            name: name.into(),
            avg_score,
            min_score,
            max_score,
            histogram: histogram::build_histogram(&values),
            scores,
        }
    }

    /// Records scored by the local heuristic after a remote failure.
    pub fn fallback_count(&self) -> usize {
        self.scores
            .iter()
            .filter(|s| s.source == ScoreSource::Fallback)
            .count()
    }
}
