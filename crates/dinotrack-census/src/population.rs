//! The roster and its census behind a single mutation entry point.
//!
//! [`Population`] is the only type allowed to change either half. Every
//! method that adds, replaces, or removes a session adjusts the census in
//! the same call, so a reader holding `&Population` can never observe a
//! count out of step with the roster that produced it.
//!
//! Census underflows are contained here and queued as
//! [`ConsistencyFault`]s; the reconciler drains them with
//! [`Population::take_faults`] once per tick.

use std::collections::BTreeMap;

use dinotrack_types::{PlayerId, PlayerSession};
use tracing::error;

use crate::census::{SpeciesCensus, ZeroCountPolicy};
use crate::verify::{self, CensusCheck, CensusDrift};
use crate::ConsistencyFault;

/// Outcome of [`Population::upsert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// The player id was not tracked; a new session was inserted.
    Inserted,
    /// The player id was tracked; the previous session was replaced.
    Replaced {
        /// The session before replacement.
        previous: PlayerSession,
    },
}

/// Roster plus census, mutated together.
#[derive(Debug, Clone)]
pub struct Population {
    roster: BTreeMap<PlayerId, PlayerSession>,
    census: SpeciesCensus,
    faults: Vec<ConsistencyFault>,
}

impl Population {
    /// Create an empty population with the given zero-count policy.
    pub const fn new(policy: ZeroCountPolicy) -> Self {
        Self {
            roster: BTreeMap::new(),
            census: SpeciesCensus::new(policy),
            faults: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The roster, keyed by player id.
    pub const fn roster(&self) -> &BTreeMap<PlayerId, PlayerSession> {
        &self.roster
    }

    /// The census derived from the roster.
    pub const fn census(&self) -> &SpeciesCensus {
        &self.census
    }

    /// Look up one session.
    pub fn get(&self, player_id: &PlayerId) -> Option<&PlayerSession> {
        self.roster.get(player_id)
    }

    /// Whether the player id is tracked.
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.roster.contains_key(player_id)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    /// Return whether no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert a session, or replace the session with the same player id.
    ///
    /// When a replacement changes the species the old species is
    /// decremented and the new one incremented. A replacement with the same
    /// species leaves the census untouched.
    pub fn upsert(&mut self, session: PlayerSession) -> Upsert {
        let species = session.species.clone();
        match self.roster.insert(session.player_id.clone(), session) {
            None => {
                self.census.increment(&species);
                Upsert::Inserted
            }
            Some(previous) => {
                if previous.species != species {
                    self.decrement(&previous.species);
                    self.census.increment(&species);
                }
                Upsert::Replaced { previous }
            }
        }
    }

    /// Remove a session and decrement its species.
    ///
    /// The stored session is authoritative for which species is
    /// decremented.
    pub fn remove(&mut self, player_id: &PlayerId) -> Option<PlayerSession> {
        let session = self.roster.remove(player_id)?;
        self.decrement(&session.species);
        Some(session)
    }

    /// Drain the consistency faults recorded since the last call.
    pub fn take_faults(&mut self) -> Vec<ConsistencyFault> {
        std::mem::take(&mut self.faults)
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Check the consistency law against the current roster.
    pub fn verify(&self) -> CensusCheck {
        verify::verify_census(&self.roster, &self.census)
    }

    /// Verify and, on drift, rebuild the census from the roster.
    ///
    /// Returns the drift that was repaired, if any.
    pub fn verify_and_repair(&mut self) -> Option<CensusDrift> {
        match self.verify() {
            CensusCheck::Consistent => None,
            CensusCheck::Drift(drift) => {
                self.census.rebuild(verify::tally(&self.roster));
                Some(drift)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn census_mut_for_tests(&mut self) -> &mut SpeciesCensus {
        &mut self.census
    }

    fn decrement(&mut self, species: &str) {
        if let Err(fault) = self.census.decrement(species) {
            error!(
                species = %fault.species,
                kind = ?fault.kind,
                roster_len = self.roster.len(),
                "census decrement would go negative"
            );
            self.faults.push(fault);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dinotrack_types::Category;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn session(id: &str, species: &str, growth: f32) -> PlayerSession {
        PlayerSession {
            player_id: PlayerId::new(id),
            display_name: format!("player-{id}"),
            species: species.to_owned(),
            category: Category::Uncategorized,
            growth,
            gender: None,
            vitals: None,
        }
    }

    #[test]
    fn insert_increments_species() {
        let mut population = Population::new(ZeroCountPolicy::Retain);
        assert_eq!(population.upsert(session("1", "Rex", 0.2)), Upsert::Inserted);
        assert_eq!(population.census().get("Rex"), 1);
        assert_eq!(population.len(), 1);
    }

    #[test]
    fn replacing_with_same_species_keeps_counts() {
        let mut population = Population::new(ZeroCountPolicy::Remove);
        population.upsert(session("1", "Stegosaurus", 0.25));
        let outcome = population.upsert(session("1", "Stegosaurus", 0.40));
        assert!(matches!(outcome, Upsert::Replaced { .. }));
        assert_eq!(population.census().get("Stegosaurus"), 1);
        assert!((population.get(&PlayerId::new("1")).unwrap().growth - 0.40).abs() < f32::EPSILON);
    }

    #[test]
    fn replacing_with_new_species_moves_count() {
        let mut population = Population::new(ZeroCountPolicy::Remove);
        population.upsert(session("1", "Dryosaurus", 1.0));
        population.upsert(session("1", "Tenontosaurus", 0.1));
        assert_eq!(population.census().get("Dryosaurus"), 0);
        assert!(!population.census().contains("Dryosaurus"));
        assert_eq!(population.census().get("Tenontosaurus"), 1);
    }

    #[test]
    fn remove_uses_stored_species() {
        let mut population = Population::new(ZeroCountPolicy::Retain);
        population.upsert(session("1", "Rex", 0.5));
        let removed = population.remove(&PlayerId::new("1")).unwrap();
        assert_eq!(removed.species, "Rex");
        assert!(population.is_empty());
        assert_eq!(population.census().get("Rex"), 0);
        assert!(population.take_faults().is_empty());
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut population = Population::new(ZeroCountPolicy::Retain);
        assert!(population.remove(&PlayerId::new("missing")).is_none());
        assert!(population.take_faults().is_empty());
    }

    #[test]
    fn random_mutation_sequences_keep_the_law() {
        let species = ["Rex", "Stegosaurus", "Troodon", "Maiasaura"];
        for policy in [ZeroCountPolicy::Retain, ZeroCountPolicy::Remove] {
            let mut rng = StdRng::seed_from_u64(0x00d1_0000);
            let mut population = Population::new(policy);
            for _ in 0..2_000 {
                let id = rng.random_range(0..12_u32).to_string();
                let pick = species.get(rng.random_range(0..species.len())).unwrap();
                if rng.random_bool(0.3) {
                    population.remove(&PlayerId::new(&id));
                } else {
                    population.upsert(session(&id, pick, 0.5));
                }
                assert_eq!(
                    population.census().total(),
                    u64::try_from(population.len()).unwrap()
                );
                assert!(population.verify().is_consistent());
            }
            assert!(population.take_faults().is_empty());
        }
    }
}
