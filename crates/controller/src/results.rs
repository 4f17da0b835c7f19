//! Ensemble result aggregation
//!
//! Reads the `scenario_<id>.results` files an ensemble produced and folds
//! each metric into a running `Samples`. Scenarios that scored −∞ (or
//! never wrote a file) contribute nothing.

use std::collections::BTreeMap;
use std::fs;

use btbfit_foundation::Samples;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::settings::ControllerSettings;

/// Read a result-file double that may be a number or an
/// Infinity/-Infinity/NaN string.
fn json_double(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct AggregatedResults {
    pub cow_cow_transmissions: Samples,
    pub cow_badger_transmissions: Samples,
    pub badger_cow_transmissions: Samples,
    pub reactors: Samples,
    pub breakdowns: Samples,
    pub detected_at_slaughter: Samples,
    pub undetected_at_slaughter: Samples,
    pub infected_animals_moved: Samples,
    pub log_likelihood: Samples,
    pub reactors_at_breakdown: BTreeMap<i64, Samples>,
    pub snp_distance: BTreeMap<i64, Samples>,
}

impl AggregatedResults {
    /// Read every present scenario result file for this ensemble.
    pub fn read(settings: &ControllerSettings) -> Result<Self> {
        let mut results = Self::default();
        for id in 0..settings.num_scenarios {
            let path = settings.scenario_results_path(id);
            if !path.exists() {
                warn!(file = %path.display(), "no result file for scenario");
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|source| Error::Io {
                path: path.display().to_string(),
                source,
            })?;
            let json: Value = serde_json::from_str(&text).map_err(|e| Error::BadResults {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            results.accumulate(&json);
        }
        debug!(
            scenarios = results.log_likelihood.size(),
            "aggregated ensemble results"
        );
        Ok(results)
    }

    fn accumulate(&mut self, json: &Value) {
        let loglikelihood = json.get("loglikelihood").and_then(json_double);
        let Some(loglikelihood) = loglikelihood else {
            return;
        };
        if loglikelihood == f64::NEG_INFINITY {
            return;
        }

        let mut metric = |key: &str, samples: &mut Samples| {
            if let Some(v) = json.get(key).and_then(json_double) {
                samples.add(v);
            }
        };
        metric("numCowCowTransmissions", &mut self.cow_cow_transmissions);
        metric(
            "numCowBadgerTransmissions",
            &mut self.cow_badger_transmissions,
        );
        metric(
            "numBadgerCowTransmissions",
            &mut self.badger_cow_transmissions,
        );
        metric("numReactors", &mut self.reactors);
        metric("numBreakdowns", &mut self.breakdowns);
        metric(
            "numDetectedAnimalsAtSlaughter",
            &mut self.detected_at_slaughter,
        );
        metric(
            "numUndetectedAnimalsAtSlaughter",
            &mut self.undetected_at_slaughter,
        );
        metric("numInfectedAnimalsMoved", &mut self.infected_animals_moved);
        self.log_likelihood.add(loglikelihood);

        if let Some(text) = json
            .get("reactorsAtBreakdownDistribution")
            .and_then(Value::as_str)
        {
            merge_distribution(&mut self.reactors_at_breakdown, text);
        }
        if let Some(text) = json.get("snpDistanceDistribution").and_then(Value::as_str) {
            if !text.is_empty() {
                merge_distribution(&mut self.snp_distance, text);
            }
        }
    }
}

/// Fold a `bin:count,...` string into per-bin sample streams.
fn merge_distribution(dist: &mut BTreeMap<i64, Samples>, text: &str) {
    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((bin, count)) = part.split_once(':') else {
            warn!(part, "skipping malformed distribution entry");
            continue;
        };
        let (Ok(bin), Ok(count)) = (bin.trim().parse::<i64>(), count.trim().parse::<f64>())
        else {
            warn!(part, "skipping malformed distribution entry");
            continue;
        };
        dist.entry(bin).or_default().add(count);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_accumulate_means() {
        let mut results = AggregatedResults::default();
        for reactors in [4.0, 6.0] {
            results.accumulate(&json!({
                "loglikelihood": -50.0,
                "numCowCowTransmissions": 2,
                "numReactors": reactors,
                "reactorsAtBreakdownDistribution": "1:3,2:1",
                "snpDistanceDistribution": "0:5",
            }));
        }
        assert_eq!(results.log_likelihood.size(), 2);
        assert_eq!(results.reactors.mean(), 5.0);
        assert_eq!(results.cow_cow_transmissions.mean(), 2.0);
        assert_eq!(results.reactors_at_breakdown[&1].mean(), 3.0);
        assert_eq!(results.snp_distance[&0].size(), 2);
    }

    #[test]
    fn test_negative_infinity_scenarios_are_skipped() {
        let mut results = AggregatedResults::default();
        results.accumulate(&json!({
            "loglikelihood": "-Infinity",
            "numReactors": 100,
        }));
        assert_eq!(results.log_likelihood.size(), 0);
        assert_eq!(results.reactors.size(), 0);
    }

    #[test]
    fn test_missing_loglikelihood_is_skipped() {
        let mut results = AggregatedResults::default();
        results.accumulate(&json!({ "numReactors": 1 }));
        assert_eq!(results.reactors.size(), 0);
    }

    #[test]
    fn test_json_double_forms() {
        assert_eq!(json_double(&json!(1.5)), Some(1.5));
        assert_eq!(json_double(&json!("-Infinity")), Some(f64::NEG_INFINITY));
        assert_eq!(json_double(&json!("2.5")), Some(2.5));
        assert_eq!(json_double(&json!(null)), None);
    }
}
