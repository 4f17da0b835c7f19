//! End-to-end scenario runs over on-disk fixtures.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use btbfit_scenario::{run_scenario, ScenarioSettings, ScenarioWorld};

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn fixture(dir: &TempDir, initial_infections: &str) -> (PathBuf, PathBuf) {
    write_file(dir, "farms.txt", "F01\nF02\nF03\nF04\nF05\n");
    write_file(dir, "setts.txt", "S1:F01,F02\nS2:F03\n");
    write_file(dir, "slaughter.txt", "36530:F01,F03\n36600:F02\n");
    write_file(dir, "observed.txt", "0:20\n1:10\n2:5\n3:2\n");
    write_file(
        dir,
        "rates.csv",
        "# year, samples, grown, rate\n1999,0,0,1.0\n2000,0,0,1.0\n2001,0,0,1.0\n",
    );
    write_file(dir, "moves.txt", "F01-F02 2,3\nF03-F04 1\n");

    let config = write_file(
        dir,
        "scenario.cfg",
        &format!(
            "\
farmIds = {base}/farms.txt
settIds = {base}/setts.txt
initialInfectionStates = {initial_infections}
diversityModel = INTERMEDIATE
slaughterhouseMovesFile = {base}/slaughter.txt
observedSnpPairwiseDistanceFile = {base}/observed.txt
movementFrequenciesFile = {base}/moves.txt
samplingRateFile = {base}/rates.csv
testIntervalInYears = 1
numInitialRestrictedHerds = 1
maxOutbreakSize = 200
stepSize = 7
numMovements = 0
numSlaughters = 100
startDate = 2000-01-01
endDate = 2001-01-01
reservoirsIncluded = false
dateFormat = %Y-%m-%d
",
            base = dir.path().display(),
        ),
    );
    let params = write_file(
        dir,
        "scenario.params",
        "\
beta = 0.002
sigma = 0.05
gamma = 0.05
alpha = 0.0001
alphaPrime = 0.0001
testSensitivity = 0.8
mutationRate = 0.01
",
    );
    (config, params)
}

#[test]
fn test_scenario_runs_and_saves_results() {
    let dir = TempDir::new().unwrap();
    let (config, params) = fixture(&dir, "C001:F01:0.0,0.5,0.25,0.25");
    let settings = ScenarioSettings::load(&config, &params).unwrap();

    let mut rng = StdRng::seed_from_u64(2024);
    let results = run_scenario(settings, &mut rng).unwrap();

    // The seeded animal is recorded as a reactor at a breakdown of one.
    assert!(results.num_reactors >= 1);
    assert!(results.num_breakdowns >= 1);

    let out = dir.path().join("scenario_0.results");
    results.save(&out).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    for key in [
        "loglikelihood",
        "numCowCowTransmissions",
        "numCowBadgerTransmissions",
        "numBadgerCowTransmissions",
        "numReactors",
        "numBreakdowns",
        "numDetectedAnimalsAtSlaughter",
        "numUndetectedAnimalsAtSlaughter",
        "numInfectedAnimalsMoved",
        "reactorsAtBreakdownDistribution",
        "snpDistanceDistribution",
    ] {
        assert!(value.get(key).is_some(), "missing result field {key}");
    }
}

#[test]
fn test_scenario_is_deterministic_for_a_seed() {
    let dir = TempDir::new().unwrap();
    let (config, params) = fixture(&dir, "C001:F01:0.0,0.5,0.25,0.25");

    let run = |seed: u64| {
        let settings = ScenarioSettings::load(&config, &params).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let results = run_scenario(settings, &mut rng).unwrap();
        serde_json::to_string(&results).unwrap()
    };

    assert_eq!(run(7), run(7));
}

#[test]
fn test_all_susceptible_seeding_never_returns() {
    // An initial-infection probability vector putting all mass on
    // SUSCEPTIBLE makes seeding loop forever; this pins that behaviour by
    // watching a worker still spinning after a grace period.
    let dir = TempDir::new().unwrap();
    let (config, params) = fixture(&dir, "C001:F01:1.0,0.0,0.0,0.0");
    let settings = ScenarioSettings::load(&config, &params).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let handle = std::thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(1);
        let world = ScenarioWorld::build(settings, &mut rng);
        let _ = tx.send(world.is_ok());
    });

    let finished = rx.recv_timeout(Duration::from_millis(200));
    assert!(
        finished.is_err(),
        "seeding returned; the all-susceptible livelock behaviour changed"
    );
    // The worker spins until the test binary exits.
    drop(handle);
}
