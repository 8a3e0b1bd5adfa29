//! Offline repetition heuristic.
//!
//! `score = 5 + 25 × (1 − unique_ratio) × U` with `U ~ Uniform[0, 1)`.
//!
//! Repetitive text (low unique-word ratio) can reach the top of the range;
//! fully distinct text always scores exactly [`BASE`]. Text with no tokens is
//! treated as having a unique ratio of `0`, which puts it in the widest
//! (worst) band `[5, 30)` without dividing by zero.
//!
//! The draw makes the heuristic non-idempotent: repeated calls on the same
//! text return different scores.

use rand::Rng;

use crate::text;

/// Lowest score the heuristic can return.
pub const BASE: f64 = 5.0;

/// Width of the score band above [`BASE`].
pub const SPREAD: f64 = 25.0;

/// Local scoring strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHeuristic;

impl LocalHeuristic {
    /// Score `text` using the thread-local RNG.
    pub fn score(&self, text: &str) -> f64 {
        self.score_with_rng(text, &mut rand::rng())
    }

    /// Score `text` drawing `U` from `rng`.
    pub fn score_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> f64 {
        let repetition = 1.0 - text::unique_word_ratio(text);
        let draw: f64 = rng.random();
        SPREAD.mul_add(repetition * draw, BASE)
    }
}
