//! Consistency law verification.
//!
//! Recomputes per-species tallies from the roster and compares them to the
//! recorded census. Any disagreement is reported as a [`CensusDrift`]
//! listing each affected species with its expected and recorded count.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use dinotrack_types::{PlayerId, PlayerSession};

use crate::census::{SpeciesCensus, ZeroCountPolicy};

/// Result of checking the census against the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CensusCheck {
    /// Every count matches the roster.
    Consistent,
    /// At least one count disagrees.
    Drift(CensusDrift),
}

impl CensusCheck {
    /// Return whether the census matched the roster.
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// Details of a census/roster disagreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusDrift {
    /// Species to `(expected, recorded)` counts, for mismatched species only.
    pub imbalances: BTreeMap<String, (u32, u32)>,
    /// Human-readable summary for logs.
    pub message: String,
}

/// Count sessions per species.
pub(crate) fn tally(roster: &BTreeMap<PlayerId, PlayerSession>) -> BTreeMap<String, u32> {
    let mut tallies: BTreeMap<String, u32> = BTreeMap::new();
    for session in roster.values() {
        let count = tallies.entry(session.species.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }
    tallies
}

/// Compare a census against the roster it should be derived from.
///
/// Under [`ZeroCountPolicy::Remove`] a zero entry is itself a drift,
/// because that policy promises zero entries never exist.
pub(crate) fn verify_census(
    roster: &BTreeMap<PlayerId, PlayerSession>,
    census: &SpeciesCensus,
) -> CensusCheck {
    let expected = tally(roster);
    let mut imbalances = BTreeMap::new();

    for (species, want) in &expected {
        let have = census.get(species);
        if have != *want {
            imbalances.insert(species.clone(), (*want, have));
        }
    }

    for (species, have) in census.iter() {
        if expected.contains_key(species) {
            continue;
        }
        let stray_zero = have == 0 && census.policy() == ZeroCountPolicy::Remove;
        if have != 0 || stray_zero {
            imbalances.insert(species.to_owned(), (0, have));
        }
    }

    if imbalances.is_empty() {
        return CensusCheck::Consistent;
    }

    let mut message = format!("census drift in {} species:", imbalances.len());
    for (species, (want, have)) in &imbalances {
        let _ = write!(message, " {species} expected {want} recorded {have};");
    }
    CensusCheck::Drift(CensusDrift {
        imbalances,
        message,
    })
}
