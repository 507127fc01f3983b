//! Per-species counters derived from the roster.
//!
//! [`SpeciesCensus`] exposes read access to everyone but mutation only to
//! [`Population`](crate::Population), which moves a count exactly when it
//! moves a session. What happens to an entry whose count reaches zero is a
//! construction-time [`ZeroCountPolicy`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConsistencyFault, FaultKind};

/// What to do with a species entry whose count reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroCountPolicy {
    /// Keep the entry at zero. Used when the display always enumerates the
    /// full known-species catalog.
    Retain,
    /// Drop the entry. Used when the display lists only observed species.
    Remove,
}

/// Mapping from canonical species name to a non-negative count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesCensus {
    counts: BTreeMap<String, u32>,
    policy: ZeroCountPolicy,
}

impl SpeciesCensus {
    /// Create an empty census with the given zero-count policy.
    pub const fn new(policy: ZeroCountPolicy) -> Self {
        Self {
            counts: BTreeMap::new(),
            policy,
        }
    }

    /// The zero-count policy fixed at construction.
    pub const fn policy(&self) -> ZeroCountPolicy {
        self.policy
    }

    /// Count for a species; zero when the species has no entry.
    pub fn get(&self, species: &str) -> u32 {
        self.counts.get(species).copied().unwrap_or(0)
    }

    /// Whether the census holds an entry (possibly zero) for the species.
    pub fn contains(&self, species: &str) -> bool {
        self.counts.contains_key(species)
    }

    /// Iterate entries in species-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(species, count)| (species.as_str(), *count))
    }

    /// Number of entries, including retained zero entries.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Return whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(u64::from(*count)))
    }

    /// Borrow the raw count map.
    pub const fn counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    pub(crate) fn increment(&mut self, species: &str) {
        let count = self.counts.entry(species.to_owned()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Decrement a species count, containing any underflow.
    ///
    /// Under [`ZeroCountPolicy::Retain`] an underflow clamps to zero; under
    /// [`ZeroCountPolicy::Remove`] the entry is removed. Either way the
    /// fault is returned for the caller to report.
    pub(crate) fn decrement(&mut self, species: &str) -> Result<(), ConsistencyFault> {
        let Some(count) = self.counts.get_mut(species) else {
            if self.policy == ZeroCountPolicy::Retain {
                self.counts.insert(species.to_owned(), 0);
            }
            return Err(ConsistencyFault {
                species: species.to_owned(),
                kind: FaultKind::MissingEntry,
            });
        };

        let Some(next) = count.checked_sub(1) else {
            if self.policy == ZeroCountPolicy::Remove {
                self.counts.remove(species);
            }
            return Err(ConsistencyFault {
                species: species.to_owned(),
                kind: FaultKind::Clamped,
            });
        };

        *count = next;
        if next == 0 && self.policy == ZeroCountPolicy::Remove {
            self.counts.remove(species);
        }
        Ok(())
    }

    /// Replace all counts with the given tallies, honoring the policy for
    /// previously seen species that are now at zero.
    pub(crate) fn rebuild(&mut self, tallies: BTreeMap<String, u32>) {
        if self.policy == ZeroCountPolicy::Retain {
            for count in self.counts.values_mut() {
                *count = 0;
            }
            self.counts.extend(tallies);
        } else {
            self.counts = tallies;
        }
    }
}
