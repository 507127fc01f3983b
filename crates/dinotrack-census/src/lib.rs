//! Roster and per-species census for the Dinotrack live census.
//!
//! Every active player-creature binding is tracked in a roster, and every
//! species count is derived from that roster. The counts are never mutated
//! on their own: they move only as a side effect of a roster mutation, and
//! the consistency law is re-checked at the end of every tick.
//!
//! # Architecture
//!
//! - [`catalog`] -- The [`KnownSpeciesCatalog`]: ordered species per
//!   category plus the alias table for internal class names.
//! - [`normalize`] -- The [`NameNormalizer`]: raw class name to canonical
//!   species and category.
//! - [`census`] -- The [`SpeciesCensus`] counter map and its
//!   [`ZeroCountPolicy`].
//! - [`population`] -- The [`Population`]: roster plus census behind one
//!   mutation entry point.
//! - [`verify`] -- Consistency law verification and drift reporting.
//!
//! # Consistency Law
//!
//! For every species `s`:
//!
//! ```text
//! census[s] == |{ p in roster : p.species == s }|
//! ```
//!
//! A decrement that would take a count below zero means the roster and the
//! census have diverged. It is clamped (or the entry removed, depending on
//! policy) and recorded as a [`ConsistencyFault`]. Faults are logged by the
//! reconciler; they never surface to presentation collaborators.
//!
//! # Usage
//!
//! ```
//! use dinotrack_census::{KnownSpeciesCatalog, NameNormalizer, Population, ZeroCountPolicy};
//! use dinotrack_types::{PlayerId, PlayerSession};
//! use std::sync::Arc;
//!
//! let normalizer = NameNormalizer::new(Arc::new(KnownSpeciesCatalog::builtin()));
//! let species = normalizer.normalize("BP_Carno_C");
//!
//! let mut population = Population::new(ZeroCountPolicy::Retain);
//! population.upsert(PlayerSession {
//!     player_id: PlayerId::new("1"),
//!     display_name: String::from("Rexy"),
//!     species: species.canonical,
//!     category: species.category,
//!     growth: 0.5,
//!     gender: None,
//!     vitals: None,
//! });
//!
//! assert_eq!(population.census().get("Carnotaurus"), 1);
//! assert!(population.verify().is_consistent());
//! ```

pub mod catalog;
pub mod census;
pub mod normalize;
pub mod population;
pub mod verify;

// Re-export primary types at crate root.
pub use catalog::KnownSpeciesCatalog;
pub use census::{SpeciesCensus, ZeroCountPolicy};
pub use normalize::{NameNormalizer, NormalizedSpecies, UNKNOWN_SPECIES};
pub use population::{Population, Upsert};
pub use verify::{CensusCheck, CensusDrift};

// ---------------------------------------------------------------------------
// Fault type
// ---------------------------------------------------------------------------

/// What went wrong when the census disagreed with a roster mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A count at zero was decremented and clamped (retain policy).
    Clamped,
    /// A species with no census entry was decremented (remove policy).
    MissingEntry,
}

/// A census decrement that would have gone negative.
///
/// This indicates a tracking bug rather than a valid game state. The
/// mutation that triggered it still commits; the fault is only reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("census consistency fault for {species}: {kind:?}")]
pub struct ConsistencyFault {
    /// The species whose count would have gone negative.
    pub species: String,
    /// How the fault was contained.
    pub kind: FaultKind,
}
