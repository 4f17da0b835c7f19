//! Fixed-step tau-leap driver
//!
//! Walks a model from its start date to its end date in fixed increments.
//! Each step: the model performs its periodic operations and registers
//! theta events, due thetas fire at their exact times, the transition
//! kernel is rebuilt, and every kernel entry realises
//! `Poisson(rate * step)` occurrences.

use rand::RngCore;
use rand_distr::{Distribution, Poisson};
use tracing::debug;

use crate::error::{Error, Result};
use crate::kernel::TransitionKernel;
use crate::thetas::ThetaQueue;

/// The simulated process, driven one step at a time.
pub trait StepModel {
    type Event;
    type Theta;

    /// Periodic operations and theta registration for `[now, now + step)`.
    fn begin_step(&mut self, now: i32, thetas: &mut ThetaQueue<Self::Theta>, rng: &mut dyn RngCore);

    /// Handle theta events due at `time`.
    fn theta(&mut self, time: i32, events: &[Self::Theta], rng: &mut dyn RngCore);

    /// Rebuild the transition kernel for the step starting at `now`.
    fn build_kernel(&mut self, now: i32, kernel: &mut TransitionKernel<Self::Event>);

    /// Apply the realisations of one kernel entry.
    fn apply_event(&mut self, event: &Self::Event, count: u64, now: i32, rng: &mut dyn RngCore);

    /// Model-side continue predicate (e.g. outbreak size bound).
    fn keep_going(&self, now: i32) -> bool;
}

/// Fixed-step tau-leap clock.
#[derive(Debug, Clone, Copy)]
pub struct TauLeapFixedStep {
    pub start: i32,
    pub end: i32,
    pub step: i32,
}

impl TauLeapFixedStep {
    /// Run the model to completion; returns the number of completed steps.
    pub fn run<M: StepModel>(&self, model: &mut M, rng: &mut dyn RngCore) -> Result<u64> {
        if self.step <= 0 {
            return Err(Error::InvalidStep { step: self.step });
        }

        let mut kernel = TransitionKernel::new();
        let mut thetas = ThetaQueue::new();
        model.build_kernel(self.start, &mut kernel);

        let mut now = self.start;
        let mut steps = 0u64;
        loop {
            if now > self.end {
                debug!(now, "terminating: end date reached");
                break;
            }
            if kernel.is_empty() {
                debug!(now, "terminating: no more possible transitions");
                break;
            }
            if !model.keep_going(now) {
                debug!(now, "terminating: model stopped");
                break;
            }

            model.begin_step(now, &mut thetas, rng);
            for (time, events) in thetas.drain_through(now + self.step) {
                model.theta(time, &events, rng);
            }

            model.build_kernel(now, &mut kernel);
            for (event, rate) in kernel.iter() {
                if !rate.is_finite() || *rate < 0.0 {
                    return Err(Error::InvalidRate { rate: *rate });
                }
                let lambda = rate * f64::from(self.step);
                if lambda <= 0.0 {
                    continue;
                }
                let count = Poisson::new(lambda)
                    .map_err(|_| Error::InvalidRate { rate: *rate })?
                    .sample(rng) as u64;
                if count > 0 {
                    model.apply_event(event, count, now, rng);
                }
            }

            now += self.step;
            steps += 1;
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    /// Counts a fixed population down: one decay event per remaining unit.
    struct Decay {
        remaining: u32,
        rate: f64,
        thetas_seen: Vec<i32>,
        steps_started: u32,
    }

    impl StepModel for Decay {
        type Event = ();
        type Theta = &'static str;

        fn begin_step(
            &mut self,
            now: i32,
            thetas: &mut ThetaQueue<Self::Theta>,
            _rng: &mut dyn RngCore,
        ) {
            self.steps_started += 1;
            if now == 0 {
                thetas.register(2, "checkpoint");
            }
        }

        fn theta(&mut self, time: i32, events: &[Self::Theta], _rng: &mut dyn RngCore) {
            assert_eq!(events, ["checkpoint"]);
            self.thetas_seen.push(time);
        }

        fn build_kernel(&mut self, _now: i32, kernel: &mut TransitionKernel<()>) {
            kernel.clear();
            for _ in 0..self.remaining {
                kernel.push((), self.rate);
            }
        }

        fn apply_event(&mut self, _event: &(), _count: u64, _now: i32, _rng: &mut dyn RngCore) {
            self.remaining = self.remaining.saturating_sub(1);
        }

        fn keep_going(&self, _now: i32) -> bool {
            true
        }
    }

    #[test]
    fn test_stops_on_empty_kernel() {
        let mut model = Decay {
            remaining: 3,
            rate: 10.0,
            thetas_seen: Vec::new(),
            steps_started: 0,
        };
        let clock = TauLeapFixedStep {
            start: 0,
            end: 1000,
            step: 1,
        };
        let mut rng = StdRng::seed_from_u64(99);
        let steps = clock.run(&mut model, &mut rng).unwrap();
        assert_eq!(model.remaining, 0);
        assert!(steps < 1000);
    }

    #[test]
    fn test_stops_at_end_date() {
        let mut model = Decay {
            remaining: 1000,
            rate: 0.0001,
            thetas_seen: Vec::new(),
            steps_started: 0,
        };
        let clock = TauLeapFixedStep {
            start: 0,
            end: 9,
            step: 2,
        };
        let mut rng = StdRng::seed_from_u64(4);
        let steps = clock.run(&mut model, &mut rng).unwrap();
        // Steps start at 0, 2, 4, 6, 8; now = 10 fails `now <= end`.
        assert_eq!(steps, 5);
        assert_eq!(model.steps_started, 5);
    }

    #[test]
    fn test_theta_fires_once_at_registered_time() {
        let mut model = Decay {
            remaining: 100,
            rate: 0.001,
            thetas_seen: Vec::new(),
            steps_started: 0,
        };
        let clock = TauLeapFixedStep {
            start: 0,
            end: 20,
            step: 5,
        };
        let mut rng = StdRng::seed_from_u64(8);
        clock.run(&mut model, &mut rng).unwrap();
        assert_eq!(model.thetas_seen, vec![2]);
    }

    #[test]
    fn test_rejects_bad_step() {
        let mut model = Decay {
            remaining: 1,
            rate: 1.0,
            thetas_seen: Vec::new(),
            steps_started: 0,
        };
        let clock = TauLeapFixedStep {
            start: 0,
            end: 10,
            step: 0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            clock.run(&mut model, &mut rng),
            Err(Error::InvalidStep { step: 0 })
        ));
    }
}
