//! Controller invocations over on-disk fixtures: the first step samples
//! the priors, later steps consume ensemble results and advance the chain.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use btbfit_controller::{run, ControllerSettings, ControllerState, Parameters};

fn write_config(dir: &TempDir, num_scenarios: usize) -> PathBuf {
    let base = dir.path().display();
    let path = dir.path().join("controller.cfg");
    fs::write(
        &path,
        format!(
            "\
numScenarios = {num_scenarios}
smoothingRatio = 50
percentageDeviation = 10
parametersFile = {base}/scenario.params
outputFile = {base}/fit.csv
stateFile = {base}/fit.state
resultsDir = {base}/results
resultsFile = scenario_{{}}.results
betaRange = 0.0001:0.01
sigmaRange = 0.001:0.1
gammaRange = 0.001:0.1
alphaRange = 0.00001:0.001
alphaPrimeRange = 0.00001:0.001
testSensitivityRange = 0.5:1.0
mutationRateRange = 0.001:0.05
"
        ),
    )
    .unwrap();
    path
}

fn write_scenario_result(dir: &TempDir, id: usize, loglikelihood: &str) {
    let results_dir = dir.path().join("results");
    fs::create_dir_all(&results_dir).unwrap();
    fs::write(
        results_dir.join(format!("scenario_{id}.results")),
        format!(
            r#"{{
  "numCowCowTransmissions": 12,
  "numCowBadgerTransmissions": 0,
  "numBadgerCowTransmissions": 0,
  "numReactors": 8,
  "numBreakdowns": 3,
  "numDetectedAnimalsAtSlaughter": 1,
  "numUndetectedAnimalsAtSlaughter": 2,
  "numInfectedAnimalsMoved": 4,
  "numSamplesTaken": 5,
  "loglikelihood": {loglikelihood},
  "reactorsAtBreakdownDistribution": "1:2,3:1",
  "snpDistanceDistribution": "0:4,1:2,2:1"
}}"#
        ),
    )
    .unwrap();
}

#[test]
fn test_first_invocation_initialises_everything() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, 2);
    let settings = ControllerSettings::load(&config).unwrap();

    run(&settings).unwrap();

    // Parameters drawn from the priors.
    let params = Parameters::read(&settings.parameters_file, false)
        .unwrap()
        .expect("parameters file written");
    let (lower, upper) = settings.bounds();
    for ((value, lo), hi) in params.to_vector().iter().zip(&lower).zip(&upper) {
        assert!(value >= lo && value <= hi);
    }

    // State advanced by one step, first step counted as accepted.
    let state = ControllerState::load(&settings.state_file, 7).unwrap();
    assert_eq!(state.num_steps, 1);
    assert!(state.last_step_accepted);
    assert_eq!(state.proposed_step, params.csv());
    for i in 0..7 {
        let expected = 10.0 * params.to_vector()[i] / 100.0;
        assert!((state.covariances[(i, i)] - expected).abs() < 1e-12);
        assert!((state.means[i] - params.to_vector()[i]).abs() < 1e-12);
    }

    // Output file holds only the header block.
    let output = fs::read_to_string(&settings.output_file).unwrap();
    assert!(output.starts_with('#'));
    assert!(output.lines().all(|l| l.is_empty() || l.starts_with('#')));
}

#[test]
fn test_second_invocation_appends_one_row_and_proposes() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, 2);
    let settings = ControllerSettings::load(&config).unwrap();

    run(&settings).unwrap();
    write_scenario_result(&dir, 0, "-120.5");
    write_scenario_result(&dir, 1, "-118.5");
    run(&settings).unwrap();

    let state = ControllerState::load(&settings.state_file, 7).unwrap();
    assert_eq!(state.num_steps, 2);
    // Step 1 is accepted unconditionally.
    assert!(state.last_step_accepted);
    assert_eq!(state.num_accepted_steps, 1);
    assert_eq!(state.log_likelihood, -119.5);

    let output = fs::read_to_string(&settings.output_file).unwrap();
    let rows: Vec<&str> = output
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    assert_eq!(rows.len(), 1);
    let fields: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(fields[0], "1");
    assert_eq!(fields[1], "1");
    // steps, accepted, 7 params, then 9 mean/stddev pairs.
    assert_eq!(fields.len(), 2 + 7 + 18);

    // Accepted steps snapshot the ensemble distributions.
    assert!(dir.path().join("fit_snpDiffDistribution.txt").exists());
    assert!(dir
        .path()
        .join("fit_numReactorsAtBreakdownDistribution.txt")
        .exists());

    // A fresh proposal awaits the next ensemble.
    let next = Parameters::read(&settings.parameters_file, false)
        .unwrap()
        .unwrap();
    assert_eq!(state.proposed_step, next.csv());
}

#[test]
fn test_missing_result_files_still_advance_the_chain() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, 3);
    let settings = ControllerSettings::load(&config).unwrap();

    run(&settings).unwrap();
    // No scenario wrote anything: the step is still recorded, rejected or
    // accepted per the first-step rule, and a row lands in the output.
    run(&settings).unwrap();

    let state = ControllerState::load(&settings.state_file, 7).unwrap();
    assert_eq!(state.num_steps, 2);
    assert_eq!(state.log_likelihood, f64::NEG_INFINITY);

    let output = fs::read_to_string(&settings.output_file).unwrap();
    let rows: Vec<&str> = output
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains("-Infinity"));
}

#[test]
fn test_negative_infinity_scenarios_are_ignored() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, 2);
    let settings = ControllerSettings::load(&config).unwrap();

    run(&settings).unwrap();
    write_scenario_result(&dir, 0, "\"-Infinity\"");
    write_scenario_result(&dir, 1, "-90.0");
    run(&settings).unwrap();

    let state = ControllerState::load(&settings.state_file, 7).unwrap();
    // Only the finite scenario contributes to the accepted likelihood.
    assert_eq!(state.log_likelihood, -90.0);
}
