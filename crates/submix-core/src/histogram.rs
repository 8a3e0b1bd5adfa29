//! Fixed-shape score histograms.
//!
//! Ten equal-width buckets spanning `[floor(min), ceil(max)]`. Buckets are
//! half-open `[start, end)` except the last, which is closed so the maximum
//! lands in exactly one bucket.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of buckets in every histogram.
pub const BUCKET_COUNT: usize = 10;

/// Range used when there are no scores to derive one from.
pub const EMPTY_RANGE: (f64, f64) = (0.0, 30.0);

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bucket {
    /// Inclusive lower bound.
    pub bucket_start: f64,
    /// Upper bound; exclusive except for the last bucket.
    pub bucket_end: f64,
    /// Scores falling in this bucket.
    pub count: usize,
}

/// Bucket `scores` into [`BUCKET_COUNT`] equal-width buckets.
///
/// Non-finite values are ignored. With no finite scores the buckets span
/// [`EMPTY_RANGE`] and every count is zero. When all scores share one
/// integral value the range collapses to a point and the closed last bucket
/// holds them all.
pub fn build_histogram(scores: &[f64]) -> Vec<Bucket> {
    let finite: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();

    let (low, high) = if finite.is_empty() {
        EMPTY_RANGE
    } else {
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min.floor(), max.ceil())
    };
    let width = (high - low) / BUCKET_COUNT as f64;
    let boundary = |k: usize| if k == BUCKET_COUNT { high } else { low + k as f64 * width };

    let mut buckets: Vec<Bucket> = (0..BUCKET_COUNT)
        .map(|k| Bucket {
            bucket_start: boundary(k),
            bucket_end: boundary(k + 1),
            count: 0,
        })
        .collect();

    for score in finite {
        let mut idx = if width > 0.0 {
            (((score - low) / width).floor().max(0.0) as usize).min(BUCKET_COUNT - 1)
        } else {
            BUCKET_COUNT - 1
        };
        // Settle floating-point drift against the stored boundaries.
        while idx + 1 < BUCKET_COUNT && score >= buckets[idx + 1].bucket_start {
            idx += 1;
        }
        while idx > 0 && score < buckets[idx].bucket_start {
            idx -= 1;
        }
        buckets[idx].count += 1;
    }

    buckets
}
