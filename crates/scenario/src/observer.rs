//! Per-step observer duties
//!
//! Theta registration for upcoming herd tests, the whole-herd test itself,
//! pre-movement testing with the movement phase, and the slaughterhouse
//! removals. These run once per tau-leap step before the kernel rebuild.

use btbfit_foundation::choice;
use btbfit_stochastic::ThetaQueue;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{debug, error, trace};

use crate::date::Day;
use crate::types::{CowId, FarmId};
use crate::world::{generate_snps, hypergeometric_draw, ScenarioWorld};

impl ScenarioWorld {
    /// Register a test event for every farm whose next WHT falls inside
    /// the coming step.
    pub(crate) fn register_theta_events(&self, now: Day, thetas: &mut ThetaQueue<FarmId>) {
        let horizon = now + self.settings.step_size;
        for (farm_id, farm) in &self.farms {
            let next = farm.next_wht_date;
            if next >= now && next < horizon {
                trace!(farm = %farm_id, next, "registering WHT");
                thetas.register(next, farm_id.clone());
            }
        }
    }

    /// Skin-test one cow. A detected cow is sampled, its SNPs regenerated
    /// to today, and it leaves the global infected set; the caller removes
    /// it from its farm.
    pub(crate) fn test_cow(&mut self, id: &CowId, date: Day, rng: &mut dyn RngCore) -> bool {
        let Some((status, last)) = self
            .cows
            .get(id)
            .map(|c| (c.status, c.last_snp_generation))
        else {
            return false;
        };
        if !status.is_detectable() || rng.random::<f64>() >= self.settings.test_sensitivity {
            return false;
        }
        let fresh = generate_snps(&mut self.ids, rng, self.settings.mutation_rate, date, last);
        if let Some(cow) = self.cows.get_mut(id) {
            cow.date_sample_taken = date;
            cow.snps.extend(fresh);
            cow.last_snp_generation = date;
        }
        self.active_cows.shift_remove(id);
        trace!(cow = %id, date, "cow tested positive");
        true
    }

    /// Whole-herd test: every resident infected cow is tested, reactors
    /// are culled and the farm's restriction state updated.
    pub(crate) fn perform_wht(&mut self, farm_id: &FarmId, date: Day, rng: &mut dyn RngCore) {
        trace!(farm = %farm_id, date, "performing WHT");
        let resident: Vec<CowId> = match self.farms.get(farm_id) {
            Some(farm) => farm.infected.clone(),
            None => return,
        };

        let mut reactors: Vec<CowId> = Vec::new();
        for cow_id in &resident {
            if self.test_cow(cow_id, date, rng) {
                reactors.push(cow_id.clone());
            }
        }

        let interval = self.settings.test_interval_days();
        if let Some(farm) = self.farms.get_mut(farm_id) {
            farm.infected.retain(|c| !reactors.contains(c));
            if reactors.is_empty() {
                farm.add_clear_test(date, interval);
            } else {
                farm.record_positive_test(date);
            }
        }
        if !reactors.is_empty() {
            self.results.record_reactors(reactors.len() as u64);
            debug!(farm = %farm_id, reactors = reactors.len(), "breakdown");
        }
    }

    /// Movement phase: keep drawing configured (departure, destination)
    /// pairs until the step's movement quota is met, pre-movement testing
    /// any infected animals that would travel.
    pub(crate) fn do_movements(&mut self, now: Day, rng: &mut dyn RngCore) {
        debug!(moves = self.moves_per_step, "moving animals in period");
        if self.movement_pairs.is_empty() || self.moves_per_step <= 0 {
            self.do_slaughterhouse_moves(now, rng);
            return;
        }

        let mut moved = 0i64;
        let mut infected_moved = 0u64;
        while moved < self.moves_per_step {
            let pair = rng.random_range(0..self.movement_pairs.len());
            let (departure_id, destination_id) = self.movement_pairs[pair].clone();

            let restricted = {
                let departure = self.farms.get(&departure_id);
                let destination = self.farms.get(&destination_id);
                match (departure, destination) {
                    (Some(dep), Some(dest)) => dep.restricted || dest.restricted,
                    _ => {
                        error!(
                            departure = %departure_id,
                            destination = %destination_id,
                            "movement references unknown farm"
                        );
                        break;
                    }
                }
            };
            if restricted {
                continue;
            }

            let mut animals_to_move: i64 = 0;
            if let Some(departure) = self.farms.get_mut(&departure_id) {
                if departure.off_movements.num_bins() > 0 {
                    animals_to_move = departure.off_movements.random_bin(rng).unwrap_or(0);
                }
                if animals_to_move > 0 {
                    let floor = (animals_to_move as u32).max(departure.infected.len() as u32);
                    departure.herd_size = departure.herd_size.max(floor);
                }
            }

            if animals_to_move > 0 {
                let (herd_size, resident) = match self.farms.get(&departure_id) {
                    Some(dep) => (u64::from(dep.herd_size), dep.infected.clone()),
                    None => break,
                };
                let infected_to_move = hypergeometric_draw(
                    rng,
                    herd_size,
                    resident.len() as u64,
                    animals_to_move as u64,
                );

                if infected_to_move == 0 {
                    trace!(
                        animals_to_move,
                        departure = %departure_id,
                        destination = %destination_id,
                        "moving clear animals"
                    );
                } else {
                    debug!(
                        animals_to_move,
                        infected = infected_to_move,
                        departure = %departure_id,
                        destination = %destination_id,
                        "moving animals with infections"
                    );
                    let picked: Vec<CowId> =
                        choice::sample_indices(rng, resident.len(), infected_to_move as usize)
                            .into_iter()
                            .map(|i| resident[i].clone())
                            .collect();

                    let mut detected = 0u32;
                    for cow_id in &picked {
                        if self.test_cow(cow_id, now, rng) {
                            if let Some(dep) = self.farms.get_mut(&departure_id) {
                                dep.remove_cow(cow_id);
                            }
                            detected += 1;
                        }
                    }

                    if detected > 0 {
                        // Detected animals were culled above; the herd is
                        // restricted and nothing travels.
                        if let Some(dep) = self.farms.get_mut(&departure_id) {
                            dep.record_positive_test(now);
                        }
                        trace!(farm = %departure_id, "placing herd under movement restriction");
                        animals_to_move = 0;
                    } else {
                        for cow_id in &picked {
                            let removed = self
                                .farms
                                .get_mut(&departure_id)
                                .map(|f| f.remove_cow(cow_id))
                                .unwrap_or(false);
                            if removed {
                                if let Some(dest) = self.farms.get_mut(&destination_id) {
                                    dest.infected.push(cow_id.clone());
                                }
                            }
                        }
                        if let Some(dest) = self.farms.get_mut(&destination_id) {
                            if dest.infected.len() as u32 > dest.herd_size {
                                dest.herd_size = dest.infected.len() as u32;
                            }
                        }
                        infected_moved += picked.len() as u64;
                    }
                }
            }
            moved += animals_to_move;
        }

        debug!(moved, infected_moved, "movement phase complete");
        self.results.record_infected_animals_moved(infected_moved);
        self.do_slaughterhouse_moves(now, rng);
    }

    /// Slaughter phase: farms that dispatched animals in the closing
    /// period send a random number to slaughter, each removed infected
    /// animal being tested on the line.
    pub(crate) fn do_slaughterhouse_moves(&mut self, date: Day, rng: &mut dyn RngCore) {
        let step = self.settings.step_size;
        let window = (date - step)..date;
        let mut farms_moving: Vec<FarmId> = self
            .farms
            .iter()
            .filter(|(_, farm)| farm.slaughter_dates.iter().any(|d| window.contains(d)))
            .map(|(id, _)| id.clone())
            .collect();
        if farms_moving.is_empty() {
            debug!(from = window.start, to = window.end, "no moves to slaughter in period");
            return;
        }

        let moves_for_period =
            self.settings.num_slaughters * i64::from(step) / self.settings.duration_days();
        trace!(
            moves_for_period,
            farms = farms_moving.len(),
            "moving animals to slaughter"
        );
        farms_moving.shuffle(rng);
        let per_farm_cap =
            ((moves_for_period as f64) / farms_moving.len() as f64).ceil().max(1.0) as i64;

        let mut moved = 0i64;
        let mut detected = 0u64;
        let mut undetected = 0u64;
        for farm_id in &farms_moving {
            let (herd_size, resident) = match self.farms.get(farm_id) {
                Some(farm) => (farm.herd_size, farm.infected.clone()),
                None => continue,
            };
            let to_move = rng.random_range(1..=per_farm_cap);
            trace!(
                to_move,
                farm = %farm_id,
                herd = herd_size,
                infected = resident.len(),
                "slaughtering animals from farm"
            );

            let herd_size = if to_move as u32 > herd_size {
                if let Some(farm) = self.farms.get_mut(farm_id) {
                    farm.herd_size = to_move as u32;
                }
                to_move as u64
            } else {
                u64::from(herd_size)
            };

            let for_removal =
                hypergeometric_draw(rng, herd_size, resident.len() as u64, to_move as u64);
            let picked: Vec<CowId> =
                choice::sample_indices(rng, resident.len(), for_removal as usize)
                    .into_iter()
                    .map(|i| resident[i].clone())
                    .collect();

            for cow_id in &picked {
                if self.test_cow(cow_id, date, rng) {
                    detected += 1;
                    if let Some(farm) = self.farms.get_mut(farm_id) {
                        farm.record_positive_test(date);
                        farm.remove_cow(cow_id);
                        trace!(
                            farm = %farm_id,
                            next_wht = farm.next_wht_date,
                            "animal detected at slaughter"
                        );
                    }
                } else {
                    undetected += 1;
                }
            }

            moved += to_move;
            if moved > moves_for_period {
                break;
            }
        }

        debug!(detected, undetected, "slaughter phase complete");
        self.results.record_detected_at_slaughter(detected);
        self.results.record_undetected_at_slaughter(undetected);
    }
}
