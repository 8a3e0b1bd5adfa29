//! Cross-file record comparison.
//!
//! Aligns two datasets on their shared ids and flags, per id, whether the
//! texts differ exactly and whether they still use the same bag of words.
//! Also hosts the id-set arithmetic used for the report header counts.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, RecordId};
use crate::text;

/// One aligned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonRow {
    /// Shared id.
    pub id: RecordId,
    /// Text of the first record with this id in the first dataset.
    pub file1_text: String,
    /// Text of the first record with this id in the second dataset.
    pub file2_text: String,
    /// Same words with the same multiplicities, in any order.
    pub words_match: bool,
    /// Texts are not byte-for-byte identical.
    pub texts_different: bool,
}

/// Record-level comparison of two datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonResult {
    /// Name of the first dataset.
    pub file1_name: String,
    /// Name of the second dataset.
    pub file2_name: String,
    /// Aligned rows, in first-dataset order.
    pub rows: Vec<ComparisonRow>,
    /// Rows whose texts differ.
    pub different_text_count: usize,
    /// Rows whose word multisets match.
    pub same_words_count: usize,
}

/// Compare two datasets record by record.
///
/// Rows are produced for each distinct id present in both datasets, in the
/// order the id first appears in `file1`. When an id repeats inside a
/// dataset only its first record takes part.
#[tracing::instrument(skip_all, fields(file1 = file1.name(), file2 = file2.name()))]
pub fn compare_datasets(file1: &Dataset, file2: &Dataset) -> ComparisonResult {
    let right_first = file2.first_by_id();
    let mut seen: HashSet<&RecordId> = HashSet::new();
    let mut rows = Vec::new();

    // Walking file1 in order, the first unseen occurrence of an id is its
    // first record.
    for left in file1.records() {
        let Some(right) = right_first.get(&left.id) else {
            continue;
        };
        if !seen.insert(&left.id) {
            continue;
        }
        rows.push(ComparisonRow {
            id: left.id.clone(),
            file1_text: left.text.clone(),
            file2_text: right.text.clone(),
            words_match: text::same_word_multiset(&left.text, &right.text),
            texts_different: left.text != right.text,
        });
    }

    let different_text_count = rows.iter().filter(|r| r.texts_different).count();
    let same_words_count = rows.iter().filter(|r| r.words_match).count();

    tracing::debug!(
        aligned = rows.len(),
        different_text_count,
        same_words_count,
        "comparison complete"
    );

    ComparisonResult {
        file1_name: file1.name().to_string(),
        file2_name: file2.name().to_string(),
        rows,
        different_text_count,
        same_words_count,
    }
}

/// Number of ids present in every dataset.
///
/// Zero when `datasets` is empty.
pub fn common_id_count(datasets: &[Dataset]) -> usize {
    let Some((first, rest)) = datasets.split_first() else {
        return 0;
    };
    let mut common = first.id_set();
    for dataset in rest {
        let ids = dataset.id_set();
        common.retain(|id| ids.contains(id));
    }
    common.len()
}

/// Number of distinct ids across the union of all datasets.
pub fn total_unique_id_count(datasets: &[Dataset]) -> usize {
    datasets
        .iter()
        .flat_map(Dataset::ids)
        .collect::<HashSet<_>>()
        .len()
}
