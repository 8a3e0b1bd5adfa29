//! Ensemble submission built from the best-of selection.
//!
//! Summarizes how much each source dataset contributed and writes the
//! selected texts back out as a submission table.

use std::io::Write;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::best_of::BestRecord;

/// How many winners one dataset supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceContribution {
    /// Dataset display name.
    pub name: String,
    /// Winning records taken from this dataset.
    pub count: usize,
    /// Share of all winners, from 0 to 100.
    pub percentage: f64,
}

/// Aggregate view of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnsembleSummary {
    /// Mean score of the winners; `0` with no winners.
    pub average_score: f64,
    /// Number of winners.
    pub record_count: usize,
    /// Per-dataset contribution, largest first.
    pub contributions: Vec<SourceContribution>,
}

/// Summarize `best` against the datasets named in `dataset_names`.
///
/// Every named dataset appears in the result, including ones that
/// contributed nothing. Repeated names are merged. Ties in count keep
/// `dataset_names` order.
pub fn summarize<S: AsRef<str>>(best: &[BestRecord], dataset_names: &[S]) -> EnsembleSummary {
    let mut contributions: Vec<SourceContribution> = Vec::new();
    for name in dataset_names {
        let name = name.as_ref();
        if contributions.iter().all(|c| c.name != name) {
            contributions.push(SourceContribution {
                name: name.to_string(),
                count: 0,
                percentage: 0.0,
            });
        }
    }

    for record in best {
        match contributions
            .iter_mut()
            .find(|c| c.name == record.source_dataset_name)
        {
            Some(c) => c.count += 1,
            None => contributions.push(SourceContribution {
                name: record.source_dataset_name.clone(),
                count: 1,
                percentage: 0.0,
            }),
        }
    }

    let total = best.len();
    for c in &mut contributions {
        c.percentage = if total == 0 {
            0.0
        } else {
            c.count as f64 * 100.0 / total as f64
        };
    }
    // Stable sort keeps input order among equal counts.
    contributions.sort_by(|a, b| b.count.cmp(&a.count));

    let average_score = if total == 0 {
        0.0
    } else {
        best.iter().map(|r| r.score).sum::<f64>() / total as f64
    };

    EnsembleSummary {
        average_score,
        record_count: total,
        contributions,
    }
}

/// Write the winners as a two-column submission table.
pub fn write_submission<W: Write>(
    best: &[BestRecord],
    writer: W,
    id_column: &str,
    text_column: &str,
) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record([id_column, text_column])?;
    for record in best {
        out.write_record([record.id.to_string().as_str(), record.text.as_str()])?;
    }
    out.flush()?;
    Ok(())
}
