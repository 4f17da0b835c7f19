//! Scenario scoring
//!
//! Samples cows from the infection tree by the year they were tested,
//! tallies pairwise SNP distances and scores the simulated distance
//! distribution against the observed one with a multinomial
//! log-likelihood.

use std::collections::BTreeMap;

use btbfit_foundation::{choice, ln_factorial, IntegerHistogram};
use rand::RngCore;
use tracing::{debug, warn};

use crate::animals::InfectedCow;
use crate::date::year_of;
use crate::error::{Error, Result};

/// Probabilities below this are treated as zero in the log-likelihood.
const MIN_PROBABILITY: f64 = 1e-15;

/// Attempts at drawing a non-empty sample pool.
const MAX_SAMPLING_ATTEMPTS: usize = 10;

/// SNP distance between two animals: the symmetric set difference.
pub fn pairwise_distance(a: &std::collections::BTreeSet<u64>, b: &std::collections::BTreeSet<u64>) -> u64 {
    a.symmetric_difference(b).count() as u64
}

/// Draw the scored subset of sampled cows, bucketed by sampling year.
///
/// Each year contributes `floor(|bucket| * rate(year))` cows drawn without
/// replacement; a year missing from the rate table contributes nothing.
/// The whole draw is retried while it comes up empty.
pub fn sample_cows_by_year<'a>(
    sampled: &[&'a InfectedCow],
    rates: &BTreeMap<i32, f64>,
    rng: &mut dyn RngCore,
) -> Vec<&'a InfectedCow> {
    let mut by_year: BTreeMap<i32, Vec<&'a InfectedCow>> = BTreeMap::new();
    for &cow in sampled {
        by_year
            .entry(year_of(cow.date_sample_taken))
            .or_default()
            .push(cow);
    }
    if by_year.is_empty() {
        return Vec::new();
    }

    let mut pool = Vec::new();
    let mut attempt = 0;
    while pool.is_empty() && attempt < MAX_SAMPLING_ATTEMPTS {
        for (year, bucket) in &by_year {
            let rate = rates.get(year).copied().unwrap_or(0.0);
            let take = (bucket.len() as f64 * rate) as usize;
            debug!(year, bucket = bucket.len(), rate, take, "sampling year bucket");
            for idx in choice::sample_indices(rng, bucket.len(), take) {
                pool.push(bucket[idx]);
            }
        }
        attempt += 1;
    }
    pool
}

/// Tally pairwise distances over all ordered pairs of distinct cows.
///
/// Every unordered pair is counted twice, once in each direction; the
/// observed data this is scored against was tallied the same way.
pub fn tally_distances(cows: &[&InfectedCow], hist: &mut IntegerHistogram) {
    if cows.len() < 2 {
        return;
    }
    for a in cows {
        for b in cows {
            if a.id != b.id {
                hist.increment(pairwise_distance(&a.snps, &b.snps) as i64);
            }
        }
    }
}

/// Multinomial log-likelihood of the simulated distance distribution under
/// the observed one.
///
/// Returns −∞ when the simulation produced nothing comparable (empty, or
/// spanning more bins than observed). A rescaled bin sum that misses the
/// observed total is an invariant error.
pub fn multinomial_log_likelihood(
    observed: &IntegerHistogram,
    simulated: &IntegerHistogram,
) -> Result<f64> {
    let total = observed.sum_counts();
    if total == 0 {
        warn!("observed distribution is empty, no likelihood");
        return Ok(f64::NEG_INFINITY);
    }
    if simulated.num_bins() > observed.num_bins() {
        warn!(
            simulated = %simulated.to_csv(),
            "simulated distances span more bins than observed, no likelihood"
        );
        return Ok(f64::NEG_INFINITY);
    }

    // Align the simulated counts onto the observed bin set.
    let mut aligned = IntegerHistogram::new();
    for bin in observed.bins() {
        aligned.set_count(bin, simulated.count(bin).unwrap_or(0));
    }
    if aligned.sum_counts() == 0 {
        warn!(simulated = %simulated.to_csv(), "no simulated distances in observed bins");
        return Ok(f64::NEG_INFINITY);
    }

    let probabilities: Vec<f64> = observed
        .bins()
        .map(|bin| observed.count(bin).unwrap_or(0) as f64 / total as f64)
        .collect();
    let bins = aligned.normalise_bins(total);

    let mut sum_x = 0u64;
    let mut sum_x_factorial = 0.0;
    let mut sum_x_log_p = 0.0;
    for (&x, &p) in bins.iter().zip(&probabilities) {
        sum_x += x;
        sum_x_factorial += ln_factorial(x);
        if p > MIN_PROBABILITY {
            sum_x_log_p += x as f64 * p.ln();
        }
    }

    if sum_x != total {
        return Err(Error::BinSumMismatch {
            sum: sum_x,
            expected: total,
        });
    }

    let log_likelihood = ln_factorial(total) - sum_x_factorial + sum_x_log_p;
    debug!(log_likelihood, "scored snp distance distribution");
    Ok(log_likelihood)
}
