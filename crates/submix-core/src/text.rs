//! Whitespace tokenization shared by the statistics, comparison and scoring
//! modules.
//!
//! Every word-based measure in this crate uses the same definition of a word:
//! a maximal run of non-whitespace characters. No punctuation stripping, no
//! case folding unless a function says so.

use std::collections::{HashMap, HashSet};

/// Number of whitespace-separated tokens in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Token frequency map of `text` (case-sensitive).
pub fn word_frequencies(text: &str) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

/// Whether two texts contain the same words the same number of times.
///
/// Order-insensitive, duplicate-sensitive: `"a b a"` matches `"a a b"` but
/// `"a b"` does not match `"a b b"`.
pub fn same_word_multiset(left: &str, right: &str) -> bool {
    word_frequencies(left) == word_frequencies(right)
}

/// Distinct lowercase tokens divided by total tokens.
///
/// Returns `0.0` for text with no tokens.
pub fn unique_word_ratio(text: &str) -> f64 {
    let total = word_count(text);
    if total == 0 {
        return 0.0;
    }
    let distinct: HashSet<String> = text.split_whitespace().map(str::to_lowercase).collect();
    distinct.len() as f64 / total as f64
}
