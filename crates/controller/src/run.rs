//! The adaptive Metropolis step
//!
//! One controller invocation advances the chain by one step: aggregate
//! the ensemble's results, accept or reject the proposed parameter
//! vector, update the running mean and covariance (every step, accepted
//! or not), and draw the next proposal from a truncated multivariate
//! normal over the prior box.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use btbfit_foundation::TruncatedMvNormal;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::parameters::Parameters;
use crate::results::AggregatedResults;
use crate::settings::ControllerSettings;
use crate::state::ControllerState;

/// Scale applied to each covariance update, 2.85/√n.
fn covariance_scale(dimension: usize) -> f64 {
    2.85 / (dimension as f64).sqrt()
}

/// Diagonal inflation keeping the covariance invertible.
const DIAGONAL_INFLATION: f64 = 0.001;

fn fmt_csv(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.6e}")
    } else if value > 0.0 {
        "Infinity".to_string()
    } else if value < 0.0 {
        "-Infinity".to_string()
    } else {
        "NaN".to_string()
    }
}

/// The Metropolis acceptance decision for the step that produced
/// `results`.
pub fn accept_step(
    state: &ControllerState,
    results: &AggregatedResults,
    settings: &ControllerSettings,
    rng: &mut dyn RngCore,
) -> bool {
    if state.num_steps == 1 {
        return true;
    }
    if results.log_likelihood.size() > 0 {
        if state.log_likelihood == f64::NEG_INFINITY {
            // The accepted step had no likelihood; take this one.
            return true;
        }
        let ratio = results.log_likelihood.mean() - state.log_likelihood;
        let threshold = ratio / settings.smoothing_ratio;
        let draw = rng.random::<f64>().ln();
        trace!(draw, threshold, "acceptance draw");
        return draw < threshold;
    }
    trace!("no likelihood in ensemble, rejecting step");
    false
}

/// Fold the evaluated vector into the running mean and covariance, then
/// draw the next proposal. Means and covariances move on every step,
/// accepted or not.
pub fn propose_next(
    state: &mut ControllerState,
    params: &Parameters,
    settings: &ControllerSettings,
    rng: &mut dyn RngCore,
) -> Result<Parameters> {
    let theta = params.to_vector();
    let n = theta.len();
    let scale = covariance_scale(n);
    let steps_taken = f64::from(state.num_steps + 1);
    let old_means = state.means.clone();

    for i in 0..n {
        state.means[i] = old_means[i] + (theta[i] - old_means[i]) / steps_taken;
    }
    for i in 0..n {
        for j in 0..n {
            let cross = (theta[i] - old_means[i]) * (theta[j] - old_means[j]);
            let current = state.covariances[(i, j)];
            state.covariances[(i, j)] = (current + (cross - current) / steps_taken) * scale;
            if i == j {
                state.covariances[(i, j)] += DIAGONAL_INFLATION;
            }
        }
    }

    let (lower, upper) = settings.bounds();
    let proposal = TruncatedMvNormal::new(
        state.means.clone(),
        state.covariances.clone(),
        DVector::from_vec(lower),
        DVector::from_vec(upper),
    )
    .map_err(Error::Config)?
    .sample(rng);

    Ok(Parameters::from_vector(
        proposal.as_slice(),
        settings.include_badgers,
    ))
}

fn write_output_header(settings: &ControllerSettings) -> Result<()> {
    let mut lines = vec![
        "#btbfit controller output".to_string(),
        "#Steps taken [1]".to_string(),
        "#Current step accepted ? [2]".to_string(),
        "#beta [3]".to_string(),
        "#sigma [4]".to_string(),
        "#gamma [5]".to_string(),
        "#alpha [6]".to_string(),
        "#alphaPrime [7]".to_string(),
        "#test sensitivity [8]".to_string(),
        "#mutation rate [9]".to_string(),
    ];
    let mut column = 10;
    if settings.include_badgers {
        lines.push(format!("#infected badger lifespan [{column}]"));
        column += 1;
    }
    for name in [
        "Likelihood",
        "Num cow-cow transmissions",
        "Num cow-badger transmissions",
        "Num badger-cow transmissions",
        "Num reactors",
        "Num breakdowns",
        "Num infected animals moved",
        "Num animals detected at slaughter",
        "Num infections undetected at slaughter",
    ] {
        lines.push(format!("#{name} (mean, stddev) [{}-{}]", column, column + 1));
        column += 2;
    }
    lines.push(String::new());

    fs::write(&settings.output_file, lines.join("\n")).map_err(|source| Error::Io {
        path: settings.output_file.display().to_string(),
        source,
    })
}

fn append_output_row(
    settings: &ControllerSettings,
    state: &ControllerState,
    params: &Parameters,
    results: &AggregatedResults,
) -> Result<()> {
    let accepted = if state.last_step_accepted { "1" } else { "0" };
    let mut fields = vec![state.num_steps.to_string(), accepted.to_string()];
    for value in params.to_vector() {
        fields.push(fmt_csv(value));
    }
    if results.log_likelihood.size() == 0 {
        fields.push("-Infinity".to_string());
        fields.push("-Infinity".to_string());
    } else {
        fields.push(fmt_csv(results.log_likelihood.mean()));
        fields.push(fmt_csv(results.log_likelihood.std_dev()));
    }
    for samples in [
        &results.cow_cow_transmissions,
        &results.cow_badger_transmissions,
        &results.badger_cow_transmissions,
        &results.reactors,
        &results.breakdowns,
        &results.infected_animals_moved,
        &results.detected_at_slaughter,
        &results.undetected_at_slaughter,
    ] {
        fields.push(fmt_csv(samples.mean()));
        fields.push(fmt_csv(samples.std_dev()));
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.output_file)
        .map_err(|source| Error::Io {
            path: settings.output_file.display().to_string(),
            source,
        })?;
    writeln!(file, "{}", fields.join(",")).map_err(|source| Error::Io {
        path: settings.output_file.display().to_string(),
        source,
    })
}

fn output_stem(settings: &ControllerSettings) -> PathBuf {
    settings.output_file.with_extension("")
}

fn save_distribution_summary(
    path: &Path,
    header: &str,
    dist: &std::collections::BTreeMap<i64, btbfit_foundation::Samples>,
) -> Result<()> {
    let mut text = String::from(header);
    for (bin, samples) in dist {
        text.push_str(&format!("{bin}\t{}\n", samples.summary()));
    }
    fs::write(path, text).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Accepted steps snapshot the ensemble's two distributions next to the
/// output file.
fn write_summary_files(settings: &ControllerSettings, results: &AggregatedResults) -> Result<()> {
    let stem = output_stem(settings);
    save_distribution_summary(
        &PathBuf::from(format!("{}_snpDiffDistribution.txt", stem.display())),
        "#Number of SNP differences [1]\n#Mean Frequency [2]\n#Standard Deviation Frequency [3]\n",
        &results.snp_distance,
    )?;
    save_distribution_summary(
        &PathBuf::from(format!(
            "{}_numReactorsAtBreakdownDistribution.txt",
            stem.display()
        )),
        "#Number of reactors at breakdown [1]\n#Mean Frequency [2]\n#Standard Deviation Frequency [3]\n",
        &results.reactors_at_breakdown,
    )?;
    Ok(())
}

/// One controller invocation: one Metropolis step.
pub fn run(settings: &ControllerSettings) -> Result<()> {
    let dimension = settings.dimension();
    let mut rng = StdRng::from_os_rng();
    let mut state = ControllerState::load(&settings.state_file, dimension)?;
    let results = AggregatedResults::read(settings)?;

    let next = if state.num_steps == 0 {
        info!("first invocation, drawing initial parameters from the priors");
        let params = Parameters::sample_from_priors(settings, &mut rng);
        params.write(&settings.parameters_file)?;

        let theta = params.to_vector();
        state.current_step = String::new();
        state.last_step_accepted = true;
        state.means = DVector::from_vec(theta.clone());
        state.covariances = DMatrix::zeros(dimension, dimension);
        for (i, value) in theta.iter().enumerate() {
            state.covariances[(i, i)] = settings.percentage_deviation * value / 100.0;
        }
        write_output_header(settings)?;
        params
    } else {
        let params = Parameters::read(&settings.parameters_file, settings.include_badgers)?
            .ok_or_else(|| {
                Error::MissingParameters(settings.parameters_file.display().to_string())
            })?;

        if accept_step(&state, &results, settings, &mut rng) {
            debug!("accepted step");
            state.current_step = state.proposed_step.clone();
            state.num_accepted_steps += 1;
            state.last_step_accepted = true;
            state.log_likelihood = if results.log_likelihood.size() == 0 {
                f64::NEG_INFINITY
            } else {
                results.log_likelihood.mean()
            };
            write_summary_files(settings, &results)?;
        } else {
            debug!("rejected step");
            state.last_step_accepted = false;
        }
        append_output_row(settings, &state, &params, &results)?;

        debug!("generating new parameters");
        let proposal = propose_next(&mut state, &params, settings, &mut rng)?;
        proposal.write(&settings.parameters_file)?;
        proposal
    };

    state.num_steps += 1;
    state.proposed_step = next.csv();
    state.rng_seed = rng.random::<i64>();
    state.save(&settings.state_file)?;
    info!(
        steps = state.num_steps,
        accepted = state.num_accepted_steps,
        "state saved"
    );
    Ok(())
}
