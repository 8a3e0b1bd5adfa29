//! Per-dataset word-count statistics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::text;

/// Descriptive statistics for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileStats {
    /// Dataset display name.
    pub name: String,
    /// Number of records, duplicates included.
    pub row_count: usize,
    /// Mean words per record, rounded to two decimals.
    pub avg_word_count: f64,
    /// Largest per-record word count.
    pub max_word_count: usize,
    /// Smallest per-record word count.
    pub min_word_count: usize,
}

/// Compute [`FileStats`] for a dataset.
///
/// An empty dataset yields zeros across the board.
#[tracing::instrument(skip_all, fields(dataset = dataset.name(), rows = dataset.len()))]
pub fn compute_file_stats(dataset: &Dataset) -> FileStats {
    let counts: Vec<usize> = dataset
        .records()
        .iter()
        .map(|r| text::word_count(&r.text))
        .collect();

    let avg_word_count = if counts.is_empty() {
        0.0
    } else {
        round2(counts.iter().sum::<usize>() as f64 / counts.len() as f64)
    };

    FileStats {
        name: dataset.name().to_string(),
        row_count: counts.len(),
        avg_word_count,
        max_word_count: counts.iter().copied().max().unwrap_or(0),
        min_word_count: counts.iter().copied().min().unwrap_or(0),
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    #[test]
    fn empty_dataset_is_all_zero() {
        let stats = compute_file_stats(&Dataset::new("empty", Vec::new()));
        assert_eq!(stats.row_count, 0);
        assert_eq!(stats.avg_word_count, 0.0);
        assert_eq!(stats.max_word_count, 0);
        assert_eq!(stats.min_word_count, 0);
    }

    #[test]
    fn single_empty_text() {
        let stats = compute_file_stats(&Dataset::new("one", vec![Record::new(1, "")]));
        assert_eq!(stats.row_count, 1);
        assert_eq!(stats.avg_word_count, 0.0);
        assert_eq!(stats.max_word_count, 0);
        assert_eq!(stats.min_word_count, 0);
    }

    #[test]
    fn mean_is_rounded_to_two_decimals() {
        let ds = Dataset::new(
            "thirds",
            vec![
                Record::new(1, "a"),
                Record::new(2, "a b"),
                Record::new(3, "a b"),
            ],
        );
        let stats = compute_file_stats(&ds);
        // 5 / 3 = 1.666..
        assert_eq!(stats.avg_word_count, 1.67);
        assert_eq!(stats.min_word_count, 1);
        assert_eq!(stats.max_word_count, 2);
    }

    #[test]
    fn duplicates_count_toward_rows() {
        let ds = Dataset::new(
            "dup",
            vec![Record::new(1, "x y z"), Record::new(1, "x")],
        );
        let stats = compute_file_stats(&ds);
        assert_eq!(stats.row_count, ds.len());
        assert_eq!(stats.avg_word_count, 2.0);
    }
}
