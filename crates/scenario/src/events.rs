//! Transmission events
//!
//! The candidate transitions the kernel is built from. Application is an
//! exhaustive match in the world's event handler.

use crate::types::{BadgerId, CowId, FarmId, InfectionState, SettId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmissionEvent {
    /// A tracked cow progresses E -> T or T -> I.
    Progression {
        cow: CowId,
        farm: FarmId,
        to: InfectionState,
    },
    /// An infectious cow exposes a susceptible herd mate.
    CowInfectsCow { source: CowId, farm: FarmId },
    /// An infectious cow seeds infection into a connected sett.
    CowInfectsBadger {
        source: CowId,
        farm: FarmId,
        sett: SettId,
    },
    /// An infected badger exposes a susceptible cow on a connected farm.
    BadgerInfectsCow {
        source: BadgerId,
        sett: SettId,
        farm: FarmId,
    },
    /// An infected badger dies and leaves its sett.
    BadgerDecay { badger: BadgerId, sett: SettId },
}
