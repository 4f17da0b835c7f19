//! Integer histograms
//!
//! Ordered bin -> count tallies used for off-movement distributions,
//! reactors-at-breakdown counts and SNP pairwise distances. The CSV form
//! `bin:count,bin:count,...` is the wire format of the scenario result file.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use crate::error::{Error, Result};

/// An ordered histogram over integer bins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerHistogram {
    bins: BTreeMap<i64, u64>,
}

impl IntegerHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation of `bin`.
    pub fn increment(&mut self, bin: i64) {
        *self.bins.entry(bin).or_insert(0) += 1;
    }

    /// Set the count of `bin` directly.
    pub fn set_count(&mut self, bin: i64, count: u64) {
        self.bins.insert(bin, count);
    }

    /// Count recorded for `bin`, if any.
    pub fn count(&self, bin: i64) -> Option<u64> {
        self.bins.get(&bin).copied()
    }

    /// Bins in ascending order.
    pub fn bins(&self) -> impl Iterator<Item = i64> + '_ {
        self.bins.keys().copied()
    }

    /// Number of distinct bins.
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Sum of all counts.
    pub fn sum_counts(&self) -> u64 {
        self.bins.values().sum()
    }

    /// Draw a bin with probability proportional to its count.
    pub fn random_bin(&self, rng: &mut dyn RngCore) -> Option<i64> {
        let total = self.sum_counts();
        if total == 0 {
            return None;
        }
        let mut target = rng.random_range(0..total);
        for (&bin, &count) in &self.bins {
            if target < count {
                return Some(bin);
            }
            target -= count;
        }
        self.bins.keys().next_back().copied()
    }

    /// Rescale all counts so their sum approaches `target`.
    ///
    /// Each count is multiplied by `target / sum` and rounded to nearest;
    /// rounding may leave the rescaled sum off `target`, which callers
    /// computing multinomial scores must check for themselves.
    pub fn normalise_bins(&self, target: u64) -> Vec<u64> {
        let total = self.sum_counts();
        if total == 0 {
            return vec![0; self.bins.len()];
        }
        let factor = target as f64 / total as f64;
        self.bins
            .values()
            .map(|&c| (c as f64 * factor).round() as u64)
            .collect()
    }

    /// `bin:count,bin:count,...` form.
    pub fn to_csv(&self) -> String {
        self.bins
            .iter()
            .map(|(b, c)| format!("{b}:{c}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the `bin:count,...` form; tolerates a trailing comma.
    pub fn parse_csv(text: &str) -> Result<Self> {
        let mut hist = Self::new();
        for part in text.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (bin, count) = part.split_once(':').ok_or_else(|| Error::MalformedValue {
                key: "histogram".into(),
                value: part.to_string(),
            })?;
            let bin = bin.trim().parse().map_err(|_| Error::MalformedValue {
                key: "histogram bin".into(),
                value: bin.to_string(),
            })?;
            let count = count.trim().parse().map_err(|_| Error::MalformedValue {
                key: "histogram count".into(),
                value: count.to_string(),
            })?;
            hist.set_count(bin, count);
        }
        Ok(hist)
    }
}
