//! Fitted parameters
//!
//! The 7/8-dimensional parameter vector walked by the Metropolis chain,
//! round-tripped through the parameters file the scenarios read.

use std::fs;
use std::path::Path;

use btbfit_foundation::KeyValueFile;
use rand::{Rng, RngCore};
use tracing::debug;

use crate::error::{Error, Result};
use crate::settings::ControllerSettings;

/// Format a value with six significant digits, `%g` style.
pub fn fmt_g(value: f64) -> String {
    if value == 0.0 {
        return "0.00000".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if !(-5..6).contains(&exponent) {
        format!("{value:.5e}")
    } else {
        let decimals = (5 - exponent).max(0) as usize;
        format!("{value:.decimals$}")
    }
}

/// Round to six significant digits, the precision the parameters file
/// carries.
pub fn round_sig(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.5e}").parse().unwrap_or(value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub beta: f64,
    pub sigma: f64,
    pub gamma: f64,
    pub alpha: f64,
    pub alpha_prime: f64,
    pub test_sensitivity: f64,
    pub mutation_rate: f64,
    pub infected_badger_lifetime: Option<f64>,
}

impl Parameters {
    /// Read the parameters file; `None` when it does not exist yet (the
    /// controller's very first invocation).
    pub fn read(path: &Path, include_badgers: bool) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(file = %path.display(), "no parameters file yet");
            return Ok(None);
        }
        let kv = KeyValueFile::from_path(path)?;
        let infected_badger_lifetime = if include_badgers {
            Some(kv.require_f64("infectedBadgerLifetime")?)
        } else {
            None
        };
        Ok(Some(Self {
            beta: kv.require_f64("beta")?,
            sigma: kv.require_f64("sigma")?,
            gamma: kv.require_f64("gamma")?,
            alpha: kv.require_f64("alpha")?,
            alpha_prime: kv.require_f64("alphaPrime")?,
            test_sensitivity: kv.require_f64("testSensitivity")?,
            mutation_rate: kv.require_f64("mutationRate")?,
            infected_badger_lifetime,
        }))
    }

    /// Draw an initial vector uniformly from the prior box, at the
    /// precision the parameters file carries.
    pub fn sample_from_priors(settings: &ControllerSettings, rng: &mut dyn RngCore) -> Self {
        let mut draw = |range: &crate::settings::PriorRange| {
            round_sig(rng.random_range(range.lower..=range.upper))
        };
        let beta = draw(&settings.beta_range);
        let sigma = draw(&settings.sigma_range);
        let gamma = draw(&settings.gamma_range);
        let alpha = draw(&settings.alpha_range);
        let alpha_prime = draw(&settings.alpha_prime_range);
        let test_sensitivity = draw(&settings.test_sensitivity_range);
        let mutation_rate = draw(&settings.mutation_rate_range);
        let infected_badger_lifetime = if settings.include_badgers {
            Some(draw(&settings.badger_lifetime_range))
        } else {
            None
        };
        Self {
            beta,
            sigma,
            gamma,
            alpha,
            alpha_prime,
            test_sensitivity,
            mutation_rate,
            infected_badger_lifetime,
        }
    }

    /// Components in chain order.
    pub fn to_vector(&self) -> Vec<f64> {
        let mut v = vec![
            self.beta,
            self.sigma,
            self.gamma,
            self.alpha,
            self.alpha_prime,
            self.test_sensitivity,
            self.mutation_rate,
        ];
        if let Some(lifetime) = self.infected_badger_lifetime {
            v.push(lifetime);
        }
        v
    }

    /// Rebuild from chain order, rounding each component to the precision
    /// of the parameters file.
    pub fn from_vector(values: &[f64], include_badgers: bool) -> Self {
        Self {
            beta: round_sig(values[0]),
            sigma: round_sig(values[1]),
            gamma: round_sig(values[2]),
            alpha: round_sig(values[3]),
            alpha_prime: round_sig(values[4]),
            test_sensitivity: round_sig(values[5]),
            mutation_rate: round_sig(values[6]),
            infected_badger_lifetime: include_badgers.then(|| round_sig(values[7])),
        }
    }

    /// The comma-separated encoding stored in the state file's step
    /// fields.
    pub fn csv(&self) -> String {
        let mut text = format!(
            "{},{},{},{},{},{},{}",
            self.beta,
            self.sigma,
            self.gamma,
            self.alpha,
            self.alpha_prime,
            self.test_sensitivity,
            self.mutation_rate
        );
        if let Some(lifetime) = self.infected_badger_lifetime {
            text.push(',');
            text.push_str(&lifetime.to_string());
        }
        text
    }

    /// Write the parameters file the scenarios read.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        text.push_str(&format!("beta = {}\n", fmt_g(self.beta)));
        text.push_str(&format!("sigma = {}\n", fmt_g(self.sigma)));
        text.push_str(&format!("gamma = {}\n", fmt_g(self.gamma)));
        text.push_str(&format!("alpha = {}\n", fmt_g(self.alpha)));
        text.push_str(&format!("alphaPrime = {}\n", fmt_g(self.alpha_prime)));
        text.push_str(&format!(
            "testSensitivity = {}\n",
            fmt_g(self.test_sensitivity)
        ));
        text.push_str(&format!("mutationRate = {}\n", fmt_g(self.mutation_rate)));
        if let Some(lifetime) = self.infected_badger_lifetime {
            text.push_str(&format!("infectedBadgerLifetime = {}\n", fmt_g(lifetime)));
        }
        fs::write(path, text).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
