//! Farms and their test bookkeeping
//!
//! A farm tracks its resident infected cows, the setts it is connected to,
//! and its whole-herd-test state. The restriction invariant:
//! `restricted <=> last_positive_test_date >= 0 && 0 <= num_clear_tests < 2`.

use btbfit_foundation::IntegerHistogram;
use rand::RngCore;
use rand_distr::{Distribution, Normal};

use crate::date::{Day, NEVER};
use crate::types::{CowId, FarmId, SettId};

/// Days until the follow-up test after a failed or first-clear WHT.
pub const RETEST_INTERVAL: Day = 60;

/// Mean and standard deviation of the initial herd-size draw.
const HERD_SIZE_MEAN: f64 = 120.0;
const HERD_SIZE_SD: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct Farm {
    pub id: FarmId,
    pub herd_size: u32,
    pub location: Option<(f64, f64)>,
    /// Setts connected to this farm; never empty after initialisation.
    pub setts: Vec<SettId>,
    /// Infected cows currently resident.
    pub infected: Vec<CowId>,
    /// Days on which this farm dispatched animals to slaughter.
    pub slaughter_dates: Vec<Day>,
    /// Animals-per-movement-event counts observed for this farm.
    pub off_movements: IntegerHistogram,
    pub restricted: bool,
    pub last_clear_test_date: Day,
    pub last_positive_test_date: Day,
    pub num_clear_tests: i32,
    pub next_wht_date: Day,
}

impl Farm {
    pub fn new(id: FarmId, herd_size: u32) -> Self {
        Self {
            id,
            herd_size,
            location: None,
            setts: Vec::new(),
            infected: Vec::new(),
            slaughter_dates: Vec::new(),
            off_movements: IntegerHistogram::new(),
            restricted: false,
            last_clear_test_date: NEVER,
            last_positive_test_date: NEVER,
            num_clear_tests: -1,
            next_wht_date: NEVER,
        }
    }

    /// Create a farm with a herd size drawn from the truncated Gaussian.
    pub fn with_drawn_size(id: FarmId, rng: &mut dyn RngCore) -> Self {
        let draw = Normal::new(HERD_SIZE_MEAN, HERD_SIZE_SD)
            .map(|d| d.sample(rng))
            .unwrap_or(HERD_SIZE_MEAN);
        Self::new(id, draw.round().max(1.0) as u32)
    }

    /// Record a positive test: restriction starts and a re-test is booked.
    pub fn record_positive_test(&mut self, date: Day) {
        self.last_positive_test_date = date;
        self.num_clear_tests = 0;
        self.next_wht_date = date + RETEST_INTERVAL;
        self.restricted = true;
    }

    /// Record a clear test; two consecutive clears lift the restriction.
    pub fn add_clear_test(&mut self, date: Day, test_interval_days: Day) {
        self.last_clear_test_date = date;
        if self.num_clear_tests == -1 || self.num_clear_tests >= 2 {
            self.num_clear_tests = -1;
            self.next_wht_date = date + test_interval_days;
            self.restricted = false;
        } else {
            self.num_clear_tests += 1;
            self.next_wht_date = date + RETEST_INTERVAL;
            self.restricted = true;
        }
    }

    pub fn contains_cow(&self, cow: &CowId) -> bool {
        self.infected.contains(cow)
    }

    /// Remove a cow from the resident list; true if it was present.
    pub fn remove_cow(&mut self, cow: &CowId) -> bool {
        match self.infected.iter().position(|c| c == cow) {
            Some(idx) => {
                self.infected.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn farm() -> Farm {
        Farm::new(FarmId::from("F01"), 100)
    }

    #[test]
    fn test_drawn_size_is_positive() {
        let mut rng = StdRng::seed_from_u64(42);
        for i in 0..200 {
            let f = Farm::with_drawn_size(FarmId(format!("F{i}")), &mut rng);
            assert!(f.herd_size >= 1);
        }
    }

    #[test]
    fn test_positive_test_restricts() {
        let mut f = farm();
        f.record_positive_test(100);
        assert!(f.restricted);
        assert_eq!(f.last_positive_test_date, 100);
        assert_eq!(f.num_clear_tests, 0);
        assert_eq!(f.next_wht_date, 160);
    }

    #[test]
    fn test_restriction_lifecycle() {
        let mut f = farm();
        f.record_positive_test(100);

        // First clear at 160: still restricted, re-test at 220.
        f.add_clear_test(160, 365);
        assert_eq!(f.num_clear_tests, 1);
        assert_eq!(f.next_wht_date, 220);
        assert!(f.restricted);

        // Second clear at 220: restriction lifted, routine testing resumes.
        f.add_clear_test(220, 365);
        assert_eq!(f.num_clear_tests, -1);
        assert!(!f.restricted);
        assert_eq!(f.next_wht_date, 220 + 365);
    }

    #[test]
    fn test_clear_test_without_prior_failure() {
        let mut f = farm();
        f.add_clear_test(50, 730);
        assert_eq!(f.num_clear_tests, -1);
        assert!(!f.restricted);
        assert_eq!(f.next_wht_date, 50 + 730);
    }

    #[test]
    fn test_remove_cow() {
        let mut f = farm();
        f.infected.push(CowId::from("a"));
        f.infected.push(CowId::from("b"));
        assert!(f.remove_cow(&CowId::from("a")));
        assert!(!f.remove_cow(&CowId::from("a")));
        assert_eq!(f.infected, vec![CowId::from("b")]);
    }
}
