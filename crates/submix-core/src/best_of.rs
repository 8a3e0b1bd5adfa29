//! Lowest-score record per id across all datasets.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::RecordId;
use crate::perplexity::PerplexityReport;

/// The winning record for one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BestRecord {
    /// Record id.
    pub id: RecordId,
    /// Winning text.
    pub text: String,
    /// Winning score.
    pub score: f64,
    /// Name of the dataset the winner came from.
    pub source_dataset_name: String,
}

/// Pick, for every id, the record with the smallest score.
///
/// Reports are flattened in order (report by report, record by record).
/// Ties keep the earlier record. Output has one entry per distinct id, in
/// the order each id first appears.
#[tracing::instrument(skip_all, fields(reports = reports.len()))]
pub fn select_best_records(reports: &[PerplexityReport]) -> Vec<BestRecord> {
    let mut best: Vec<BestRecord> = Vec::new();
    let mut slot: HashMap<&RecordId, usize> = HashMap::new();

    for report in reports {
        for scored in &report.scores {
            match slot.get(&scored.id) {
                Some(&i) => {
                    if scored.score < best[i].score {
                        best[i].text.clone_from(&scored.text);
                        best[i].score = scored.score;
                        best[i].source_dataset_name.clone_from(&report.name);
                    }
                }
                None => {
                    slot.insert(&scored.id, best.len());
                    best.push(BestRecord {
                        id: scored.id.clone(),
                        text: scored.text.clone(),
                        score: scored.score,
                        source_dataset_name: report.name.clone(),
                    });
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perplexity::ScoredRecord;
    use crate::scoring::ScoreSource;

    fn report(name: &str, rows: &[(i64, &str, f64)]) -> PerplexityReport {
        PerplexityReport::new(
            name,
            rows.iter()
                .map(|(id, text, score)| ScoredRecord {
                    id: (*id).into(),
                    text: (*text).to_string(),
                    score: *score,
                    source: ScoreSource::Local,
                })
                .collect(),
        )
    }

    #[test]
    fn picks_minimum_per_id() {
        let a = report("A", &[(1, "a1", 10.0), (2, "a2", 5.0)]);
        let b = report("B", &[(1, "b1", 7.0), (2, "b2", 9.0)]);
        let best = select_best_records(&[a, b]);

        assert_eq!(best.len(), 2);
        assert_eq!(best[0].id, RecordId::from(1));
        assert_eq!(best[0].text, "b1");
        assert_eq!(best[0].source_dataset_name, "B");
        assert_eq!(best[1].text, "a2");
        assert_eq!(best[1].source_dataset_name, "A");
    }

    #[test]
    fn ties_keep_first_encountered() {
        let a = report("A", &[(1, "a", 8.0)]);
        let b = report("B", &[(1, "b", 8.0)]);
        let best = select_best_records(&[a.clone(), b.clone()]);
        assert_eq!(best[0].source_dataset_name, "A");

        let reversed = select_best_records(&[b, a]);
        assert_eq!(reversed[0].source_dataset_name, "B");
        assert_eq!(reversed[0].score, best[0].score);
    }

    #[test]
    fn union_of_ids_in_first_appearance_order() {
        let a = report("A", &[(3, "", 1.0), (1, "", 1.0)]);
        let b = report("B", &[(2, "", 1.0), (3, "", 0.5)]);
        let ids: Vec<_> = select_best_records(&[a, b]).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RecordId::from(3), RecordId::from(1), RecordId::from(2)]);
    }

    #[test]
    fn duplicate_ids_within_a_report_compete() {
        let a = report("A", &[(1, "worse", 9.0), (1, "better", 4.0)]);
        let best = select_best_records(&[a]);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].text, "better");
    }

    #[test]
    fn selection_is_minimal_and_order_independent() {
        let a = report("A", &[(1, "", 12.5), (2, "", 6.0), (3, "", 20.0)]);
        let b = report("B", &[(1, "", 11.0), (2, "", 6.5)]);
        let c = report("C", &[(1, "", 13.0), (3, "", 19.0), (4, "", 7.0)]);
        let forward = select_best_records(&[a.clone(), b.clone(), c.clone()]);
        let backward = select_best_records(&[c.clone(), b.clone(), a.clone()]);

        for winner in &forward {
            for r in [&a, &b, &c] {
                for s in r.scores.iter().filter(|s| s.id == winner.id) {
                    assert!(winner.score <= s.score);
                }
            }
            let mirror = backward.iter().find(|w| w.id == winner.id).unwrap();
            assert_eq!(mirror.score, winner.score);
        }
        assert_eq!(forward.len(), 4);
    }

    #[test]
    fn no_reports_no_winners() {
        assert!(select_best_records(&[]).is_empty());
    }
}
