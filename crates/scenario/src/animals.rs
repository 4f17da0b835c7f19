//! Infected animals
//!
//! Cows and badgers accumulate SNPs along their infection history. SNPs are
//! opaque integers issued by the scenario-wide counter; only set
//! differences between animals ever matter.

use std::collections::BTreeSet;

use crate::date::{Day, NEVER};
use crate::types::{BadgerId, CowId, InfectionState};

/// An infected cow.
#[derive(Debug, Clone)]
pub struct InfectedCow {
    pub id: CowId,
    pub snps: BTreeSet<u64>,
    /// Last day this cow's SNP set was brought up to date.
    pub last_snp_generation: Day,
    /// Day a sample was taken from this cow, NEVER until then.
    pub date_sample_taken: Day,
    pub status: InfectionState,
}

impl InfectedCow {
    pub fn new(id: CowId, snps: BTreeSet<u64>, day: Day, status: InfectionState) -> Self {
        Self {
            id,
            snps,
            last_snp_generation: day,
            date_sample_taken: NEVER,
            status,
        }
    }

    pub fn was_sampled(&self) -> bool {
        self.date_sample_taken != NEVER
    }
}

/// An infected badger; always behaves as infectious.
#[derive(Debug, Clone)]
pub struct InfectedBadger {
    pub id: BadgerId,
    pub snps: BTreeSet<u64>,
    pub last_snp_generation: Day,
    pub date_infected: Day,
}

impl InfectedBadger {
    pub fn new(id: BadgerId, snps: BTreeSet<u64>, day: Day, date_infected: Day) -> Self {
        Self {
            id,
            snps,
            last_snp_generation: day,
            date_infected,
        }
    }
}
