//! Scenario settings
//!
//! Immutable configuration and fitted parameters, merged from the scenario
//! config file and the controller-written parameters file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use btbfit_foundation::KeyValueFile;
use tracing::debug;

use crate::date::{parse_day, Day};
use crate::error::{Error, Result};

/// How much SNP diversity a badger reservoir contributes on spillover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiversityModel {
    Maximum,
    Minimum,
    Intermediate,
}

impl FromStr for DiversityModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MAXIMUM" => Ok(DiversityModel::Maximum),
            "MINIMUM" => Ok(DiversityModel::Minimum),
            "INTERMEDIATE" => Ok(DiversityModel::Intermediate),
            other => Err(Error::UnknownDiversityModel(other.to_string())),
        }
    }
}

const CONFIG_KEYS: &[&str] = &[
    "farmIds",
    "settIds",
    "initialInfectionStates",
    "diversityModel",
    "slaughterhouseMovesFile",
    "observedSnpPairwiseDistanceFile",
    "movementFrequenciesFile",
    "samplingRateFile",
    "testIntervalInYears",
    "numInitialRestrictedHerds",
    "maxOutbreakSize",
    "stepSize",
    "numMovements",
    "numSlaughters",
    "startDate",
    "endDate",
    "reservoirsIncluded",
    "dateFormat",
    "badgerLifetime",
    "rngSeed",
    // parameters file
    "beta",
    "sigma",
    "gamma",
    "alpha",
    "alphaPrime",
    "testSensitivity",
    "mutationRate",
    "infectedBadgerLifetime",
];

#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub farm_ids_file: PathBuf,
    pub sett_ids_file: PathBuf,
    pub slaughterhouse_moves_file: PathBuf,
    pub observed_snp_file: PathBuf,
    pub movement_frequencies_file: PathBuf,
    pub sampling_rate_file: PathBuf,
    pub initial_infection_states: String,
    pub diversity_model: DiversityModel,
    pub test_interval_years: i32,
    pub num_initial_restricted_herds: usize,
    pub max_outbreak_size: usize,
    pub step_size: i32,
    pub num_movements: i64,
    pub num_slaughters: i64,
    pub start_date: Day,
    pub end_date: Day,
    pub reservoirs_included: bool,
    pub rng_seed: Option<u64>,

    pub beta: f64,
    pub sigma: f64,
    pub gamma: f64,
    pub alpha: f64,
    pub alpha_prime: f64,
    pub test_sensitivity: f64,
    pub mutation_rate: f64,
    /// Present when badgers are modelled explicitly (decay events).
    pub infected_badger_lifetime: Option<f64>,
}

impl ScenarioSettings {
    /// Load and merge the scenario config and parameters files.
    pub fn load(config: &Path, params: &Path) -> Result<Self> {
        let mut kv = KeyValueFile::from_path(config)?;
        kv.merge(KeyValueFile::from_path(params)?);
        kv.reject_unknown(CONFIG_KEYS)
            .map_err(Error::Config)?;
        debug!(config = %config.display(), params = %params.display(), "loaded settings");

        let date_format = kv.require_str("dateFormat")?.to_string();

        // Explicit badger modelling is switched on by the config's
        // badgerLifetime key; the lifetime value itself comes from the
        // fitted infectedBadgerLifetime parameter when present.
        let infected_badger_lifetime = if kv.has("badgerLifetime") {
            match kv.get_f64("infectedBadgerLifetime")? {
                Some(v) => Some(v),
                None => kv.get_f64("badgerLifetime")?,
            }
        } else {
            None
        };

        Ok(Self {
            farm_ids_file: kv.require_str("farmIds")?.into(),
            sett_ids_file: kv.require_str("settIds")?.into(),
            slaughterhouse_moves_file: kv.require_str("slaughterhouseMovesFile")?.into(),
            observed_snp_file: kv.require_str("observedSnpPairwiseDistanceFile")?.into(),
            movement_frequencies_file: kv.require_str("movementFrequenciesFile")?.into(),
            sampling_rate_file: kv.require_str("samplingRateFile")?.into(),
            initial_infection_states: kv.require_str("initialInfectionStates")?.to_string(),
            diversity_model: kv.require_str("diversityModel")?.parse()?,
            test_interval_years: kv.require_i64("testIntervalInYears")? as i32,
            num_initial_restricted_herds: kv.require_i64("numInitialRestrictedHerds")? as usize,
            max_outbreak_size: kv.require_i64("maxOutbreakSize")? as usize,
            step_size: kv.require_i64("stepSize")? as i32,
            num_movements: kv.require_i64("numMovements")?,
            num_slaughters: kv.require_i64("numSlaughters")?,
            start_date: parse_day(kv.require_str("startDate")?, &date_format)?,
            end_date: parse_day(kv.require_str("endDate")?, &date_format)?,
            reservoirs_included: kv.get_bool("reservoirsIncluded")?.unwrap_or(false),
            rng_seed: kv.get_u64("rngSeed")?,
            beta: kv.require_f64("beta")?,
            sigma: kv.require_f64("sigma")?,
            gamma: kv.require_f64("gamma")?,
            alpha: kv.require_f64("alpha")?,
            alpha_prime: kv.require_f64("alphaPrime")?,
            test_sensitivity: kv.require_f64("testSensitivity")?,
            mutation_rate: kv.require_f64("mutationRate")?,
            infected_badger_lifetime,
        })
    }

    /// Whether badger decay events are modelled at all.
    pub fn badgers_modelled(&self) -> bool {
        self.infected_badger_lifetime.is_some()
    }

    pub fn test_interval_days(&self) -> Day {
        365 * self.test_interval_years
    }

    pub fn duration_days(&self) -> i64 {
        i64::from(self.end_date) - i64::from(self.start_date)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn base_config() -> String {
        "\
farmIds = farms.txt
settIds = setts.txt
initialInfectionStates = c1:f1:0.0,1.0,0.0,0.0
diversityModel = INTERMEDIATE
slaughterhouseMovesFile = slaughter.txt
observedSnpPairwiseDistanceFile = observed.txt
movementFrequenciesFile = moves.txt
samplingRateFile = rates.csv
testIntervalInYears = 1
numInitialRestrictedHerds = 2
maxOutbreakSize = 500
stepSize = 7
numMovements = 1000
numSlaughters = 200
startDate = 2000-01-01
endDate = 2005-01-01
reservoirsIncluded = true
dateFormat = %Y-%m-%d
"
        .to_string()
    }

    const PARAMS: &str = "\
beta = 0.001
sigma = 0.01
gamma = 0.02
alpha = 0.0005
alphaPrime = 0.0002
testSensitivity = 0.8
mutationRate = 0.004
";

    #[test]
    fn test_load_merged() {
        let dir = TempDir::new().unwrap();
        let config = write_file(&dir, "scenario.cfg", &base_config());
        let params = write_file(&dir, "scenario.params", PARAMS);
        let settings = ScenarioSettings::load(&config, &params).unwrap();
        assert_eq!(settings.step_size, 7);
        assert_eq!(settings.beta, 0.001);
        assert!(settings.reservoirs_included);
        assert!(!settings.badgers_modelled());
        assert_eq!(settings.test_interval_days(), 365);
        assert_eq!(settings.duration_days(), 1827);
    }

    #[test]
    fn test_badger_lifetime_switch() {
        let dir = TempDir::new().unwrap();
        let config = write_file(
            &dir,
            "scenario.cfg",
            &format!("{}badgerLifetime = 365\n", base_config()),
        );
        let params = write_file(
            &dir,
            "scenario.params",
            &format!("{PARAMS}infectedBadgerLifetime = 200\n"),
        );
        let settings = ScenarioSettings::load(&config, &params).unwrap();
        assert!(settings.badgers_modelled());
        assert_eq!(settings.infected_badger_lifetime, Some(200.0));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let config = write_file(
            &dir,
            "scenario.cfg",
            &format!("{}mysteryKnob = 1\n", base_config()),
        );
        let params = write_file(&dir, "scenario.params", PARAMS);
        assert!(ScenarioSettings::load(&config, &params).is_err());
    }

    #[test]
    fn test_unknown_diversity_model_rejected() {
        let dir = TempDir::new().unwrap();
        let config = write_file(
            &dir,
            "scenario.cfg",
            &base_config().replace("INTERMEDIATE", "MODERATE"),
        );
        let params = write_file(&dir, "scenario.params", PARAMS);
        assert!(matches!(
            ScenarioSettings::load(&config, &params),
            Err(Error::UnknownDiversityModel(_))
        ));
    }
}
