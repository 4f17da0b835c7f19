//! Scenario world
//!
//! The full state of one simulation: farms, setts, infected animals, the
//! infection tree and the accumulating results. Implements the tau-leap
//! `StepModel`: kernel construction, event application and the per-step
//! observer duties (the latter live in `observer.rs`).

use std::collections::{BTreeMap, BTreeSet};

use btbfit_foundation::{choice, IntegerHistogram};
use btbfit_stochastic::{StepModel, TauLeapFixedStep, ThetaQueue, TransitionKernel};
use indexmap::{IndexMap, IndexSet};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Hypergeometric, Poisson};
use tracing::{debug, error, info, trace};

use crate::animals::{InfectedBadger, InfectedCow};
use crate::date::{Day, NEVER};
use crate::error::{Error, Result};
use crate::events::TransmissionEvent;
use crate::herd::{Farm, RETEST_INTERVAL};
use crate::inputs;
use crate::results::ScenarioResults;
use crate::score;
use crate::sett::Sett;
use crate::settings::{DiversityModel, ScenarioSettings};
use crate::tree::{InfectionTree, Node};
use crate::types::{BadgerId, CowId, FarmId, InfectionState, SettId};

/// Scenario-wide id and SNP counters.
///
/// SNP indices are issued monotonically; a SNP's value only ever matters
/// through set differences.
#[derive(Debug, Default)]
pub struct IdSource {
    last_snp: u64,
    next_cow: u32,
    next_badger: u32,
    next_seed_badger: u32,
}

impl IdSource {
    fn issue_snps(&mut self, count: u64) -> BTreeSet<u64> {
        (0..count)
            .map(|_| {
                self.last_snp += 1;
                self.last_snp
            })
            .collect()
    }

    fn next_cow_id(&mut self) -> CowId {
        self.next_cow += 1;
        CowId(format!("Cow_{:05}", self.next_cow))
    }

    fn next_badger_id(&mut self) -> BadgerId {
        self.next_badger += 1;
        BadgerId(format!("Badger_{:05}", self.next_badger))
    }

    fn next_seed_badger_id(&mut self) -> BadgerId {
        self.next_seed_badger += 1;
        BadgerId(format!("Badger_seed_{:05}", self.next_seed_badger))
    }

    /// Highest SNP index issued so far.
    pub fn last_snp(&self) -> u64 {
        self.last_snp
    }
}

pub(crate) fn poisson_draw(rng: &mut dyn RngCore, lambda: f64) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    Poisson::new(lambda)
        .map(|d| d.sample(rng) as u64)
        .unwrap_or(0)
}

pub(crate) fn hypergeometric_draw(
    rng: &mut dyn RngCore,
    population: u64,
    successes: u64,
    draws: u64,
) -> u64 {
    Hypergeometric::new(population, successes, draws)
        .map(|d| d.sample(rng))
        .unwrap_or(0)
}

/// SNPs appearing in `(last_generation, day]`.
///
/// `day < last_generation` is the initial-seeding marker and yields at
/// least one SNP; `day == last_generation` yields none and does not touch
/// the counter.
pub(crate) fn generate_snps(
    ids: &mut IdSource,
    rng: &mut dyn RngCore,
    mutation_rate: f64,
    day: Day,
    last_generation: Day,
) -> BTreeSet<u64> {
    let days = i64::from(day) - i64::from(last_generation);
    let count = if days < 0 {
        poisson_draw(rng, 1.0).max(1)
    } else if days == 0 {
        0
    } else {
        poisson_draw(rng, mutation_rate * days as f64)
    };
    ids.issue_snps(count)
}

pub struct ScenarioWorld {
    pub(crate) settings: ScenarioSettings,
    pub(crate) farms: IndexMap<FarmId, Farm>,
    pub(crate) setts: IndexMap<SettId, Sett>,
    pub(crate) cows: IndexMap<CowId, InfectedCow>,
    pub(crate) badgers: IndexMap<BadgerId, InfectedBadger>,
    /// Cows currently carrying infection anywhere in the cluster.
    pub(crate) active_cows: IndexSet<CowId>,
    pub(crate) tree: InfectionTree,
    pub(crate) results: ScenarioResults,
    pub(crate) movement_pairs: Vec<(FarmId, FarmId)>,
    pub(crate) observed_snp_distribution: IntegerHistogram,
    pub(crate) sampling_rates: BTreeMap<i32, f64>,
    pub(crate) ids: IdSource,
    pub(crate) moves_per_step: i64,
}

impl ScenarioWorld {
    /// Read the input files, seed infection and set up the initial test
    /// state.
    pub fn build(settings: ScenarioSettings, rng: &mut dyn RngCore) -> Result<Self> {
        if settings.duration_days() <= 0 {
            return Err(Error::BadDate {
                value: "endDate before startDate".to_string(),
                format: String::new(),
            });
        }

        let mut farms = IndexMap::new();
        for id in inputs::read_farm_ids(&settings.farm_ids_file)? {
            farms.insert(id.clone(), Farm::with_drawn_size(id, rng));
        }

        let mut setts = IndexMap::new();
        let mut farms_with_setts: IndexSet<FarmId> = IndexSet::new();
        for (sett_id, sett_farms) in inputs::read_setts(&settings.sett_ids_file)? {
            let connected: Vec<FarmId> = sett_farms
                .into_iter()
                .filter(|f| farms.contains_key(f))
                .collect();
            for farm_id in &connected {
                if let Some(farm) = farms.get_mut(farm_id) {
                    farm.setts.push(sett_id.clone());
                }
                farms_with_setts.insert(farm_id.clone());
            }
            setts.insert(sett_id.clone(), Sett::new(sett_id, connected));
        }
        // Farms absent from the sett file get a reservoir of their own.
        let mut synthesised = 0u32;
        let unattached: Vec<FarmId> = farms
            .keys()
            .filter(|id| !farms_with_setts.contains(*id))
            .cloned()
            .collect();
        for farm_id in unattached {
            synthesised += 1;
            let sett_id = SettId(format!("RESERVOIR_X{synthesised:07}"));
            setts.insert(
                sett_id.clone(),
                Sett::new(sett_id.clone(), vec![farm_id.clone()]),
            );
            if let Some(farm) = farms.get_mut(&farm_id) {
                farm.setts.push(sett_id);
            }
        }

        for (date, move_farms) in
            inputs::read_slaughterhouse_moves(&settings.slaughterhouse_moves_file)?
        {
            for farm_id in move_farms {
                if let Some(farm) = farms.get_mut(&farm_id) {
                    farm.slaughter_dates.push(date);
                }
            }
        }

        let observed_snp_distribution =
            inputs::read_observed_distribution(&settings.observed_snp_file)?;
        let sampling_rates = inputs::read_sampling_rates(&settings.sampling_rate_file)?;
        let movement_pairs =
            inputs::read_movement_frequencies(&settings.movement_frequencies_file, &mut farms)?;

        let moves_per_step =
            settings.num_movements * i64::from(settings.step_size) / settings.duration_days();

        let mut world = Self {
            settings,
            farms,
            setts,
            cows: IndexMap::new(),
            badgers: IndexMap::new(),
            active_cows: IndexSet::new(),
            tree: InfectionTree::new(),
            results: ScenarioResults::new(),
            movement_pairs,
            observed_snp_distribution,
            sampling_rates,
            ids: IdSource::default(),
            moves_per_step,
        };
        world.seed_infections(rng)?;
        world.mark_restricted_herds(rng);
        Ok(world)
    }

    pub fn results(&self) -> &ScenarioResults {
        &self.results
    }

    pub fn into_results(self) -> ScenarioResults {
        self.results
    }

    /// The tau-leap clock for these settings.
    pub fn clock(&self) -> TauLeapFixedStep {
        TauLeapFixedStep {
            start: self.settings.start_date,
            end: self.settings.end_date,
            step: self.settings.step_size,
        }
    }

    pub(crate) fn farm_contains(&self, farm: &FarmId, cow: &CowId) -> bool {
        self.farms
            .get(farm)
            .map(|f| f.contains_cow(cow))
            .unwrap_or(false)
    }

    /// Bring a cow's SNP set up to `now`.
    pub(crate) fn refresh_cow_snps(&mut self, id: &CowId, now: Day, rng: &mut dyn RngCore) {
        let Some(last) = self.cows.get(id).map(|c| c.last_snp_generation) else {
            return;
        };
        let fresh = generate_snps(&mut self.ids, rng, self.settings.mutation_rate, now, last);
        if let Some(cow) = self.cows.get_mut(id) {
            cow.snps.extend(fresh);
            cow.last_snp_generation = now;
        }
    }

    fn refresh_badger_snps(&mut self, id: &BadgerId, now: Day, rng: &mut dyn RngCore) {
        let Some(last) = self.badgers.get(id).map(|b| b.last_snp_generation) else {
            return;
        };
        let fresh = generate_snps(&mut self.ids, rng, self.settings.mutation_rate, now, last);
        if let Some(badger) = self.badgers.get_mut(id) {
            badger.snps.extend(fresh);
            badger.last_snp_generation = now;
        }
    }

    /// Seed infected animals from `initialInfectionStates`, repeating the
    /// whole pass until at least one infection exists.
    fn seed_infections(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        let seeding = self.settings.initial_infection_states.clone();
        let mut infections_added = 0usize;
        while infections_added == 0 {
            info!("seeding infections");
            for entry in seeding.split(';') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let parts: Vec<&str> = entry.splitn(3, ':').collect();
                if parts.len() != 3 {
                    return Err(Error::MalformedLine {
                        file: "initialInfectionStates".to_string(),
                        line: entry.to_string(),
                    });
                }
                let cow_id = CowId::from(parts[0].trim());
                let farm_id = FarmId::from(parts[1].trim());
                if !self.farms.contains_key(&farm_id) {
                    return Err(Error::UnknownFarm {
                        farm: farm_id.to_string(),
                        context: "initialInfectionStates".to_string(),
                    });
                }
                let probabilities: Vec<f64> = parts[2]
                    .split(',')
                    .map(|p| p.trim().parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| Error::MalformedLine {
                        file: "initialInfectionStates".to_string(),
                        line: entry.to_string(),
                    })?;
                if probabilities.len() != InfectionState::ALL.len() {
                    return Err(Error::MalformedLine {
                        file: "initialInfectionStates".to_string(),
                        line: entry.to_string(),
                    });
                }

                let state = InfectionState::ALL[choice::pick_weighted(rng, &probabilities)];
                if state == InfectionState::Susceptible {
                    debug!(cow = %cow_id, %state, "not seeding cow");
                    continue;
                }

                let start = self.settings.start_date;
                let snps = generate_snps(
                    &mut self.ids,
                    rng,
                    self.settings.mutation_rate,
                    -1,
                    start,
                );
                let cow = InfectedCow::new(cow_id.clone(), snps.clone(), start, state);
                if let Some(farm) = self.farms.get_mut(&farm_id) {
                    farm.infected.push(cow_id.clone());
                }
                self.cows.insert(cow_id.clone(), cow);
                self.active_cows.insert(cow_id.clone());
                self.results.record_reactors(1);
                self.tree.insert(Node::Root, Node::Cow(cow_id.clone()));
                debug!(cow = %cow_id, %state, farm = %farm_id, "seeded infected cow");
                infections_added += 1;

                if self.settings.reservoirs_included {
                    let sett_ids = self
                        .farms
                        .get(&farm_id)
                        .map(|f| f.setts.clone())
                        .unwrap_or_default();
                    if let Some(sett_id) = sett_ids
                        .get(rng.random_range(0..sett_ids.len().max(1)))
                        .cloned()
                    {
                        let lifetime = self
                            .settings
                            .infected_badger_lifetime
                            .unwrap_or(0.0)
                            .floor()
                            .max(0.0) as Day;
                        let date_infected = start - rng.random_range(0..=lifetime);
                        let badger_id = self.ids.next_seed_badger_id();
                        let badger =
                            InfectedBadger::new(badger_id.clone(), snps.clone(), start, date_infected);
                        if let Some(sett) = self.setts.get_mut(&sett_id) {
                            sett.badgers.push(badger_id.clone());
                        }
                        self.badgers.insert(badger_id.clone(), badger);
                        self.tree.insert(Node::Root, Node::Badger(badger_id));
                        infections_added += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Pick the initially restricted herds and back-date everyone's test
    /// history.
    fn mark_restricted_herds(&mut self, rng: &mut dyn RngCore) {
        let restricted: IndexSet<usize> = choice::sample_indices(
            rng,
            self.farms.len(),
            self.settings.num_initial_restricted_herds,
        )
        .into_iter()
        .collect();
        let interval = self.settings.test_interval_days();
        let start = self.settings.start_date;

        for (idx, farm) in self.farms.values_mut().enumerate() {
            if restricted.contains(&idx) {
                let previous_test = start - rng.random_range(0..=RETEST_INTERVAL);
                if rng.random::<f64>() < 0.5 {
                    // Currently failed: awaiting the first clear re-test.
                    farm.last_clear_test_date = NEVER;
                    farm.record_positive_test(previous_test);
                } else {
                    // One clear test since the failure.
                    farm.record_positive_test(previous_test - RETEST_INTERVAL);
                    farm.add_clear_test(previous_test, interval);
                }
            } else {
                let previous_test = start - rng.random_range(0..=interval);
                farm.last_positive_test_date = NEVER;
                farm.last_clear_test_date = previous_test;
                farm.num_clear_tests = -1;
                farm.next_wht_date = previous_test + interval;
                farm.restricted = false;
            }
        }
    }

    /// Rebuild the transition kernel for the step starting at `now`.
    pub(crate) fn rebuild_kernel(&self, now: Day, kernel: &mut TransitionKernel<TransmissionEvent>) {
        kernel.clear();
        let s = &self.settings;

        for (farm_id, farm) in &self.farms {
            if farm.infected.is_empty() {
                continue;
            }
            trace!(farm = %farm_id, "generating kernel for farm");
            let susceptible =
                (i64::from(farm.herd_size) - farm.infected.len() as i64).max(0) as f64;

            for cow_id in &farm.infected {
                let Some(cow) = self.cows.get(cow_id) else {
                    continue;
                };
                match cow.status {
                    InfectionState::Exposed => kernel.push(
                        TransmissionEvent::Progression {
                            cow: cow_id.clone(),
                            farm: farm_id.clone(),
                            to: InfectionState::TestSensitive,
                        },
                        s.sigma,
                    ),
                    InfectionState::TestSensitive => kernel.push(
                        TransmissionEvent::Progression {
                            cow: cow_id.clone(),
                            farm: farm_id.clone(),
                            to: InfectionState::Infectious,
                        },
                        s.gamma,
                    ),
                    InfectionState::Infectious => {
                        kernel.push(
                            TransmissionEvent::CowInfectsCow {
                                source: cow_id.clone(),
                                farm: farm_id.clone(),
                            },
                            susceptible * s.beta,
                        );
                        if s.reservoirs_included {
                            for sett_id in &farm.setts {
                                kernel.push(
                                    TransmissionEvent::CowInfectsBadger {
                                        source: cow_id.clone(),
                                        farm: farm_id.clone(),
                                        sett: sett_id.clone(),
                                    },
                                    s.alpha_prime,
                                );
                            }
                        }
                    }
                    InfectionState::Susceptible => {}
                }
            }

            if s.reservoirs_included {
                for sett_id in &farm.setts {
                    let Some(sett) = self.setts.get(sett_id) else {
                        continue;
                    };
                    for badger_id in &sett.badgers {
                        kernel.push(
                            TransmissionEvent::BadgerInfectsCow {
                                source: badger_id.clone(),
                                sett: sett_id.clone(),
                                farm: farm_id.clone(),
                            },
                            susceptible * s.alpha,
                        );
                    }
                }
            }
        }

        if let Some(lifetime) = s.infected_badger_lifetime {
            for (sett_id, sett) in &self.setts {
                for badger_id in &sett.badgers {
                    let Some(badger) = self.badgers.get(badger_id) else {
                        continue;
                    };
                    let days_infected = i64::from(now) - i64::from(badger.date_infected);
                    // The exponential CDF used directly as a kernel weight.
                    let weight = 1.0 - (-(days_infected as f64) / lifetime).exp();
                    kernel.push(
                        TransmissionEvent::BadgerDecay {
                            badger: badger_id.clone(),
                            sett: sett_id.clone(),
                        },
                        weight.max(0.0),
                    );
                }
            }
        }
    }

    /// Apply one realised event. The kernel rates already carry the
    /// multiplicity, so a drawn count applies the transition once.
    pub(crate) fn handle_event(
        &mut self,
        event: &TransmissionEvent,
        times: u64,
        now: Day,
        rng: &mut dyn RngCore,
    ) {
        trace!(?event, times, now, "performing event");
        match event {
            TransmissionEvent::Progression { cow, farm, to } => {
                if !self.farm_contains(farm, cow) {
                    trace!(cow = %cow, farm = %farm, "source cow no longer on farm, dropping event");
                    return;
                }
                self.refresh_cow_snps(cow, now, rng);
                if let Some(c) = self.cows.get_mut(cow) {
                    c.status = *to;
                }
            }
            TransmissionEvent::CowInfectsCow { source, farm } => {
                if !self.farm_contains(farm, source) {
                    trace!(cow = %source, farm = %farm, "source cow no longer on farm, dropping event");
                    return;
                }
                self.refresh_cow_snps(source, now, rng);
                let Some((snps, last)) = self
                    .cows
                    .get(source)
                    .map(|c| (c.snps.clone(), c.last_snp_generation))
                else {
                    return;
                };
                let id = self.ids.next_cow_id();
                let cow = InfectedCow::new(id.clone(), snps, last, InfectionState::Exposed);
                if let Some(f) = self.farms.get_mut(farm) {
                    f.infected.push(id.clone());
                }
                self.cows.insert(id.clone(), cow);
                self.active_cows.insert(id.clone());
                self.results.record_cow_cow_transmission();
                self.tree.insert(Node::Cow(source.clone()), Node::Cow(id));
            }
            TransmissionEvent::CowInfectsBadger { source, farm, sett } => {
                if !self.farm_contains(farm, source) {
                    trace!(cow = %source, farm = %farm, "source cow no longer on farm, dropping event");
                    return;
                }
                self.refresh_cow_snps(source, now, rng);
                let Some((snps, last)) = self
                    .cows
                    .get(source)
                    .map(|c| (c.snps.clone(), c.last_snp_generation))
                else {
                    return;
                };
                let id = self.ids.next_badger_id();
                let badger = InfectedBadger::new(id.clone(), snps, last, now);
                if let Some(s) = self.setts.get_mut(sett) {
                    s.badgers.push(id.clone());
                }
                self.badgers.insert(id.clone(), badger);
                self.results.record_cow_badger_transmission();
                self.tree.insert(Node::Cow(source.clone()), Node::Badger(id));
            }
            TransmissionEvent::BadgerInfectsCow { source, farm, .. } => {
                let snps = self.badger_contribution(source, farm, now, rng);
                let id = self.ids.next_cow_id();
                let cow = InfectedCow::new(id.clone(), snps, now, InfectionState::Exposed);
                if let Some(f) = self.farms.get_mut(farm) {
                    f.infected.push(id.clone());
                }
                self.cows.insert(id.clone(), cow);
                self.active_cows.insert(id.clone());
                self.results.record_badger_cow_transmission();
                self.tree
                    .insert(Node::Badger(source.clone()), Node::Cow(id.clone()));
                debug!(badger = %source, cow = %id, "badger to cow transmission");
            }
            TransmissionEvent::BadgerDecay { badger, sett } => {
                if let Some(s) = self.setts.get_mut(sett) {
                    s.remove_badger(badger);
                }
            }
        }
    }

    /// The SNP set a badger passes on, per the configured diversity model.
    fn badger_contribution(
        &mut self,
        source: &BadgerId,
        farm: &FarmId,
        now: Day,
        rng: &mut dyn RngCore,
    ) -> BTreeSet<u64> {
        match self.settings.diversity_model {
            DiversityModel::Maximum => {
                // Full mixing: every badger in every sett attached to the
                // farm contributes, each regenerated to today.
                let mut union = BTreeSet::new();
                let sett_ids = self
                    .farms
                    .get(farm)
                    .map(|f| f.setts.clone())
                    .unwrap_or_default();
                for sett_id in sett_ids {
                    let badger_ids = self
                        .setts
                        .get(&sett_id)
                        .map(|s| s.badgers.clone())
                        .unwrap_or_default();
                    for badger_id in badger_ids {
                        self.refresh_badger_snps(&badger_id, now, rng);
                        if let Some(b) = self.badgers.get(&badger_id) {
                            union.extend(b.snps.iter().copied());
                        }
                    }
                }
                union
            }
            DiversityModel::Minimum => self
                .badgers
                .get(source)
                .map(|b| b.snps.clone())
                .unwrap_or_default(),
            DiversityModel::Intermediate => {
                self.refresh_badger_snps(source, now, rng);
                self.badgers
                    .get(source)
                    .map(|b| b.snps.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Sample the infection tree, tally pairwise SNP distances and score
    /// the scenario. An invariant failure in the scorer leaves a −∞
    /// likelihood in the results.
    pub fn finalise(&mut self, rng: &mut dyn RngCore) {
        let sampled: Vec<&InfectedCow> = self
            .tree
            .cows()
            .filter_map(|id| self.cows.get(id))
            .filter(|c| c.was_sampled())
            .collect();
        info!(
            sampled = sampled.len(),
            tree = self.tree.len(),
            "gathering sampled cows from the infection tree"
        );

        let pool = score::sample_cows_by_year(&sampled, &self.sampling_rates, rng);
        if !sampled.is_empty() {
            self.results.record_samples_taken(pool.len() as u64);
        }

        debug!(pool = pool.len(), "calculating pairwise snp distances");
        score::tally_distances(&pool, &mut self.results.snp_distance);

        let loglikelihood = match score::multinomial_log_likelihood(
            &self.observed_snp_distribution,
            &self.results.snp_distance,
        ) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "could not score scenario");
                f64::NEG_INFINITY
            }
        };
        self.results.loglikelihood = loglikelihood;
        info!(loglikelihood, "scenario scored");
    }
}

impl StepModel for ScenarioWorld {
    type Event = TransmissionEvent;
    type Theta = FarmId;

    fn begin_step(&mut self, now: i32, thetas: &mut ThetaQueue<FarmId>, rng: &mut dyn RngCore) {
        debug!(now, "observing step");
        self.register_theta_events(now, thetas);
        self.do_movements(now, rng);
    }

    fn theta(&mut self, time: i32, events: &[FarmId], rng: &mut dyn RngCore) {
        debug!(time, tests = events.len(), "observing herd tests");
        for farm_id in events {
            let farm_id = farm_id.clone();
            self.perform_wht(&farm_id, time, rng);
        }
    }

    fn build_kernel(&mut self, now: i32, kernel: &mut TransitionKernel<TransmissionEvent>) {
        self.rebuild_kernel(now, kernel);
    }

    fn apply_event(
        &mut self,
        event: &TransmissionEvent,
        count: u64,
        now: i32,
        rng: &mut dyn RngCore,
    ) {
        self.handle_event(event, count, now, rng);
    }

    fn keep_going(&self, _now: i32) -> bool {
        self.active_cows.len() <= self.settings.max_outbreak_size
    }
}

/// Build, run and score one scenario.
pub fn run_scenario(settings: ScenarioSettings, rng: &mut dyn RngCore) -> Result<ScenarioResults> {
    let clock = TauLeapFixedStep {
        start: settings.start_date,
        end: settings.end_date,
        step: settings.step_size,
    };
    info!(
        start = settings.start_date,
        end = settings.end_date,
        "running scenario"
    );
    let mut world = ScenarioWorld::build(settings, rng)?;
    let steps = clock.run(&mut world, rng)?;
    debug!(steps, "simulation finished");
    world.finalise(rng);
    Ok(world.into_results())
}

#[cfg(test)]
pub(crate) mod testkit {
    use super::*;

    /// Minimal settings for in-memory worlds; the file paths are never read.
    pub(crate) fn settings() -> ScenarioSettings {
        ScenarioSettings {
            farm_ids_file: "farms.txt".into(),
            sett_ids_file: "setts.txt".into(),
            slaughterhouse_moves_file: "slaughter.txt".into(),
            observed_snp_file: "observed.txt".into(),
            movement_frequencies_file: "moves.txt".into(),
            sampling_rate_file: "rates.csv".into(),
            initial_infection_states: String::new(),
            diversity_model: DiversityModel::Intermediate,
            test_interval_years: 1,
            num_initial_restricted_herds: 0,
            max_outbreak_size: 10_000,
            step_size: 1,
            num_movements: 0,
            num_slaughters: 0,
            start_date: 36_525,
            end_date: 36_890,
            reservoirs_included: false,
            rng_seed: None,
            beta: 0.0,
            sigma: 0.0,
            gamma: 0.0,
            alpha: 0.0,
            alpha_prime: 0.0,
            test_sensitivity: 1.0,
            mutation_rate: 0.0,
            infected_badger_lifetime: None,
        }
    }

    /// An empty world over the given settings.
    pub(crate) fn world(settings: ScenarioSettings) -> ScenarioWorld {
        ScenarioWorld {
            settings,
            farms: IndexMap::new(),
            setts: IndexMap::new(),
            cows: IndexMap::new(),
            badgers: IndexMap::new(),
            active_cows: IndexSet::new(),
            tree: InfectionTree::new(),
            results: ScenarioResults::new(),
            movement_pairs: Vec::new(),
            observed_snp_distribution: IntegerHistogram::new(),
            sampling_rates: BTreeMap::new(),
            ids: IdSource::default(),
            moves_per_step: 0,
        }
    }

    /// Add a farm with one sett and the given infected cows.
    pub(crate) fn add_farm(
        world: &mut ScenarioWorld,
        name: &str,
        herd_size: u32,
        cows: &[(&str, InfectionState)],
    ) {
        let farm_id = FarmId::from(name);
        let sett_id = SettId(format!("SETT_{name}"));
        let mut farm = Farm::new(farm_id.clone(), herd_size);
        farm.setts.push(sett_id.clone());
        world
            .setts
            .insert(sett_id.clone(), Sett::new(sett_id, vec![farm_id.clone()]));
        for (cow_name, status) in cows {
            let cow_id = CowId::from(*cow_name);
            let cow = InfectedCow::new(
                cow_id.clone(),
                BTreeSet::new(),
                world.settings.start_date,
                *status,
            );
            farm.infected.push(cow_id.clone());
            world.cows.insert(cow_id.clone(), cow);
            world.active_cows.insert(cow_id.clone());
            world.tree.insert(Node::Root, Node::Cow(cow_id));
        }
        world.farms.insert(farm_id, farm);
    }
}
