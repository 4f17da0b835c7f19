//! Truncated multivariate normal sampling
//!
//! Proposal distribution for the adaptive Metropolis walk: a multivariate
//! normal restricted to a `[lower, upper]` box, sampled by rejection.

use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use tracing::warn;

use crate::error::{Error, Result};

/// Rejection draws before falling back to componentwise clamping.
const MAX_REJECTIONS: usize = 10_000;

/// A multivariate normal restricted to a box.
#[derive(Debug, Clone)]
pub struct TruncatedMvNormal {
    mean: DVector<f64>,
    chol_l: DMatrix<f64>,
    lower: DVector<f64>,
    upper: DVector<f64>,
}

impl TruncatedMvNormal {
    pub fn new(
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
        lower: DVector<f64>,
        upper: DVector<f64>,
    ) -> Result<Self> {
        let n = mean.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(Error::DimensionMismatch(format!(
                "covariance is {}x{} for a {}-dimensional mean",
                covariance.nrows(),
                covariance.ncols(),
                n
            )));
        }
        if lower.len() != n || upper.len() != n {
            return Err(Error::DimensionMismatch(format!(
                "bounds are {}/{}-dimensional for a {}-dimensional mean",
                lower.len(),
                upper.len(),
                n
            )));
        }
        let chol = covariance
            .cholesky()
            .ok_or(Error::NotPositiveDefinite)?;
        Ok(Self {
            mean,
            chol_l: chol.l(),
            lower,
            upper,
        })
    }

    fn in_box(&self, x: &DVector<f64>) -> bool {
        x.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }

    /// Draw a sample inside the box.
    pub fn sample(&self, rng: &mut dyn RngCore) -> DVector<f64> {
        let n = self.mean.len();
        for _ in 0..MAX_REJECTIONS {
            let z = DVector::from_fn(n, |_, _| StandardNormal.sample(rng));
            let x = &self.mean + &self.chol_l * z;
            if self.in_box(&x) {
                return x;
            }
        }
        warn!("truncated normal rejected {MAX_REJECTIONS} draws, clamping to bounds");
        let z = DVector::from_fn(n, |_, _| StandardNormal.sample(rng));
        let x = &self.mean + &self.chol_l * z;
        DVector::from_fn(n, |i, _| x[i].clamp(self.lower[i], self.upper[i]))
    }
}
