//! Controller settings
//!
//! The fitting controller's configuration: ensemble size, file locations,
//! and the uniform prior box for each fitted parameter.

use std::path::{Path, PathBuf};

use btbfit_foundation::KeyValueFile;
use tracing::debug;

use crate::error::{Error, Result};

const CONFIG_KEYS: &[&str] = &[
    "numScenarios",
    "smoothingRatio",
    "percentageDeviation",
    "parametersFile",
    "outputFile",
    "stateFile",
    "resultsDir",
    "resultsFile",
    "includeBadgers",
    "betaRange",
    "sigmaRange",
    "gammaRange",
    "alphaRange",
    "alphaPrimeRange",
    "testSensitivityRange",
    "mutationRateRange",
    "infectedBadgerLifetime",
];

/// Inclusive `[lower, upper]` prior range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorRange {
    pub lower: f64,
    pub upper: f64,
}

impl PriorRange {
    fn parse(key: &str, value: &str) -> Result<Self> {
        let (lo, hi) = value.split_once(':').ok_or_else(|| Error::BadRange {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        let bad = || Error::BadRange {
            key: key.to_string(),
            value: value.to_string(),
        };
        let lower: f64 = lo.trim().parse().map_err(|_| bad())?;
        let upper: f64 = hi.trim().parse().map_err(|_| bad())?;
        if !(lower <= upper) {
            return Err(bad());
        }
        Ok(Self { lower, upper })
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub num_scenarios: usize,
    pub smoothing_ratio: f64,
    pub percentage_deviation: f64,
    pub parameters_file: PathBuf,
    pub output_file: PathBuf,
    pub state_file: PathBuf,
    pub results_dir: PathBuf,
    /// Result file name template; `{}` is replaced by the scenario id.
    pub results_file: String,
    pub include_badgers: bool,
    pub beta_range: PriorRange,
    pub sigma_range: PriorRange,
    pub gamma_range: PriorRange,
    pub alpha_range: PriorRange,
    pub alpha_prime_range: PriorRange,
    pub test_sensitivity_range: PriorRange,
    pub mutation_rate_range: PriorRange,
    pub badger_lifetime_range: PriorRange,
}

impl ControllerSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let kv = KeyValueFile::from_path(path)?;
        kv.reject_unknown(CONFIG_KEYS).map_err(Error::Config)?;
        debug!(config = %path.display(), "loaded controller settings");

        let include_badgers = kv.get_bool("includeBadgers")?.unwrap_or(false);
        let range = |key: &str| -> Result<PriorRange> {
            PriorRange::parse(key, kv.require_str(key)?)
        };
        // The badger-lifetime prior lives under the bare key
        // `infectedBadgerLifetime`, not `...Range`.
        let badger_lifetime_range = if include_badgers {
            PriorRange::parse(
                "infectedBadgerLifetime",
                kv.require_str("infectedBadgerLifetime")?,
            )?
        } else {
            PriorRange {
                lower: 0.0,
                upper: 1.0,
            }
        };

        Ok(Self {
            num_scenarios: kv.require_i64("numScenarios")? as usize,
            smoothing_ratio: kv.require_f64("smoothingRatio")?,
            percentage_deviation: kv.require_f64("percentageDeviation")?,
            parameters_file: kv.require_str("parametersFile")?.into(),
            output_file: kv.require_str("outputFile")?.into(),
            state_file: kv.require_str("stateFile")?.into(),
            results_dir: kv.require_str("resultsDir")?.into(),
            results_file: kv.require_str("resultsFile")?.to_string(),
            include_badgers,
            beta_range: range("betaRange")?,
            sigma_range: range("sigmaRange")?,
            gamma_range: range("gammaRange")?,
            alpha_range: range("alphaRange")?,
            alpha_prime_range: range("alphaPrimeRange")?,
            test_sensitivity_range: range("testSensitivityRange")?,
            mutation_rate_range: range("mutationRateRange")?,
            badger_lifetime_range,
        })
    }

    /// Parameter-space dimension: 7, or 8 with the badger lifetime.
    pub fn dimension(&self) -> usize {
        if self.include_badgers {
            8
        } else {
            7
        }
    }

    /// Prior bounds in parameter order.
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let mut ranges = vec![
            self.beta_range,
            self.sigma_range,
            self.gamma_range,
            self.alpha_range,
            self.alpha_prime_range,
            self.test_sensitivity_range,
            self.mutation_rate_range,
        ];
        if self.include_badgers {
            ranges.push(self.badger_lifetime_range);
        }
        (
            ranges.iter().map(|r| r.lower).collect(),
            ranges.iter().map(|r| r.upper).collect(),
        )
    }

    /// Path of the result file for one scenario id.
    pub fn scenario_results_path(&self, id: usize) -> PathBuf {
        self.results_dir
            .join(self.results_file.replacen("{}", &id.to_string(), 1))
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::testcfg::base_config;
    use super::*;

    fn load(text: &str) -> Result<ControllerSettings> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("controller.cfg");
        fs::write(&path, text).unwrap();
        ControllerSettings::load(&path)
    }

    #[test]
    fn test_load_without_badgers() {
        let settings = load(&base_config(false)).unwrap();
        assert_eq!(settings.num_scenarios, 4);
        assert_eq!(settings.dimension(), 7);
        assert_eq!(settings.beta_range.lower, 0.0001);
        let (lower, upper) = settings.bounds();
        assert_eq!(lower.len(), 7);
        assert_eq!(upper[5], 1.0);
    }

    #[test]
    fn test_badger_lifetime_prior_key() {
        let settings = load(&base_config(true)).unwrap();
        assert_eq!(settings.dimension(), 8);
        assert_eq!(
            settings.badger_lifetime_range,
            PriorRange {
                lower: 100.0,
                upper: 1000.0
            }
        );
    }

    #[test]
    fn test_scenario_results_path() {
        let settings = load(&base_config(false)).unwrap();
        assert_eq!(
            settings.scenario_results_path(3),
            PathBuf::from("results/scenario_3.results")
        );
    }

    #[test]
    fn test_bad_range_rejected() {
        assert!(matches!(
            load(&base_config(false).replace("0.0001:0.01", "0.01")),
            Err(Error::BadRange { .. })
        ));
        assert!(matches!(
            load(&base_config(false).replace("0.0001:0.01", "0.01:0.0001")),
            Err(Error::BadRange { .. })
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let text = format!("{}typoKey = 1\n", base_config(false));
        assert!(load(&text).is_err());
    }
}
