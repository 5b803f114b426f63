// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text similarity used to relate claims

use std::collections::HashSet;
use std::sync::Arc;

/// Scores two texts in `[0, 1]`; higher is more similar
pub type SimilarityFn = Arc<dyn Fn(&str, &str) -> f64 + Send + Sync>;

/// Word-overlap (Jaccard) similarity of two texts
///
/// Words are whitespace-separated and compared case-insensitively. Returns
/// 0.0 when either text has no words.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let words = |text: &str| -> HashSet<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    };
    let (left, right) = (words(a), words(b));
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}

/// Distinct texts are related when one contains the other or their
/// similarity exceeds `threshold`
pub fn is_related(a: &str, b: &str, similarity: &dyn Fn(&str, &str) -> f64, threshold: f64) -> bool {
    a != b && (a.contains(b) || b.contains(a) || similarity(a, b) > threshold)
}

#[cfg(test)]
#[path = "similarity_tests.rs"]
mod tests;
