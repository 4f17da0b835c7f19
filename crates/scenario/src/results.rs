//! Scenario results
//!
//! The counters and distributions a scenario accumulates, written as
//! `scenario_<id>.results` for the controller. The two distributions go on
//! the wire as `bin:count,...` strings, and non-finite likelihoods as the
//! string `-Infinity` (plain JSON has no spelling for them).

use std::fs;
use std::path::Path;

use btbfit_foundation::IntegerHistogram;
use serde::ser::Serializer;
use serde::Serialize;

use crate::error::{Error, Result};

fn ser_double<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if *value > 0.0 {
        serializer.serialize_str("Infinity")
    } else {
        serializer.serialize_str("-Infinity")
    }
}

fn ser_histogram<S: Serializer>(
    hist: &IntegerHistogram,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hist.to_csv())
}

#[derive(Debug, Default, Serialize)]
pub struct ScenarioResults {
    #[serde(rename = "numCowCowTransmissions")]
    pub num_cow_cow_transmissions: u64,
    #[serde(rename = "numCowBadgerTransmissions")]
    pub num_cow_badger_transmissions: u64,
    #[serde(rename = "numBadgerCowTransmissions")]
    pub num_badger_cow_transmissions: u64,
    #[serde(rename = "numReactors")]
    pub num_reactors: u64,
    #[serde(rename = "numBreakdowns")]
    pub num_breakdowns: u64,
    #[serde(rename = "numDetectedAnimalsAtSlaughter")]
    pub num_detected_at_slaughter: u64,
    #[serde(rename = "numUndetectedAnimalsAtSlaughter")]
    pub num_undetected_at_slaughter: u64,
    #[serde(rename = "numInfectedAnimalsMoved")]
    pub num_infected_animals_moved: u64,
    #[serde(rename = "numSamplesTaken")]
    pub num_samples_taken: u64,
    #[serde(rename = "loglikelihood", serialize_with = "ser_double")]
    pub loglikelihood: f64,
    #[serde(
        rename = "reactorsAtBreakdownDistribution",
        serialize_with = "ser_histogram"
    )]
    pub reactors_at_breakdown: IntegerHistogram,
    #[serde(rename = "snpDistanceDistribution", serialize_with = "ser_histogram")]
    pub snp_distance: IntegerHistogram,
}

impl ScenarioResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cow_cow_transmission(&mut self) {
        self.num_cow_cow_transmissions += 1;
    }

    pub fn record_cow_badger_transmission(&mut self) {
        self.num_cow_badger_transmissions += 1;
    }

    pub fn record_badger_cow_transmission(&mut self) {
        self.num_badger_cow_transmissions += 1;
    }

    /// A breakdown: one or more reactors found at the same test.
    pub fn record_reactors(&mut self, count: u64) {
        self.num_reactors += count;
        self.num_breakdowns += 1;
        self.reactors_at_breakdown.increment(count as i64);
    }

    pub fn record_infected_animals_moved(&mut self, count: u64) {
        self.num_infected_animals_moved += count;
    }

    pub fn record_detected_at_slaughter(&mut self, count: u64) {
        self.num_detected_at_slaughter += count;
    }

    pub fn record_undetected_at_slaughter(&mut self, count: u64) {
        self.num_undetected_at_slaughter += count;
    }

    pub fn record_samples_taken(&mut self, count: u64) {
        self.num_samples_taken += count;
    }

    /// Write the result file for the given scenario id.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Save(e.to_string()))?;
        fs::write(path, json).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_record_reactors_tracks_breakdowns() {
        let mut results = ScenarioResults::new();
        results.record_reactors(3);
        results.record_reactors(1);
        assert_eq!(results.num_reactors, 4);
        assert_eq!(results.num_breakdowns, 2);
        assert_eq!(results.reactors_at_breakdown.count(3), Some(1));
        assert_eq!(results.reactors_at_breakdown.count(1), Some(1));
    }

    #[test]
    fn test_json_field_names() {
        let mut results = ScenarioResults::new();
        results.record_cow_cow_transmission();
        results.snp_distance.increment(2);
        results.snp_distance.increment(2);
        results.loglikelihood = -12.5;

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["numCowCowTransmissions"], 1);
        assert_eq!(json["snpDistanceDistribution"], "2:2");
        assert_eq!(json["loglikelihood"], -12.5);
    }

    #[test]
    fn test_negative_infinity_as_string() {
        let mut results = ScenarioResults::new();
        results.loglikelihood = f64::NEG_INFINITY;
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["loglikelihood"], "-Infinity");
    }

    #[test]
    fn test_save_writes_parseable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario_0.results");
        let results = ScenarioResults::new();
        results.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("numReactors").is_some());
        assert!(value.get("reactorsAtBreakdownDistribution").is_some());
    }
}
