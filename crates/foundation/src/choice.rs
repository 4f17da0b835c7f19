//! Random selection helpers
//!
//! Weighted index choice and without-replacement subset selection over the
//! shared generator.

use rand::{Rng, RngCore};

/// Pick an index with probability proportional to its weight.
///
/// Weights do not need to sum to 1. Returns 0 on an empty or all-zero
/// weight slice.
pub fn pick_weighted(rng: &mut dyn RngCore, weights: &[f64]) -> usize {
    if weights.is_empty() {
        return 0;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0;
    }
    let threshold = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if threshold < cumulative {
            return i;
        }
    }
    weights.len() - 1
}

/// Choose `k` distinct indices from `0..n` uniformly at random.
///
/// Partial Fisher-Yates over an index vector; `k >= n` returns all indices
/// in shuffled order.
pub fn sample_indices(rng: &mut dyn RngCore, n: usize, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let k = k.min(n);
    for i in 0..k {
        let j = rng.random_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}
