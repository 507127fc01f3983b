//! The immutable view published after every tick.
//!
//! Presentation collaborators never see the reconciler itself. After a tick
//! commits, the scheduler replaces the shared [`CensusView`] in one write,
//! so every reader observes either the pre-tick or the post-tick state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dinotrack_census::{SpeciesCensus, ZeroCountPolicy};
use dinotrack_types::{PlayerId, PlayerSession};
use serde::Serialize;
use tokio::sync::RwLock;

/// Handle to the most recently published view.
pub type SharedView = Arc<RwLock<CensusView>>;

/// Roster and census as of the end of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct CensusView {
    /// Number of ticks applied so far.
    pub tick: u64,
    /// Active sessions keyed by player id.
    pub roster: BTreeMap<PlayerId, PlayerSession>,
    /// Per-species counts derived from the roster.
    pub census: SpeciesCensus,
    /// When this view was published.
    pub updated_at: DateTime<Utc>,
}

impl CensusView {
    /// A view with nothing tracked yet.
    pub fn empty(policy: ZeroCountPolicy) -> Self {
        Self {
            tick: 0,
            roster: BTreeMap::new(),
            census: SpeciesCensus::new(policy),
            updated_at: Utc::now(),
        }
    }

    /// Wrap the view for sharing between the scheduler and readers.
    pub fn into_shared(self) -> SharedView {
        Arc::new(RwLock::new(self))
    }

    /// Zero-count policy of the census.
    pub const fn policy(&self) -> ZeroCountPolicy {
        self.census.policy()
    }

    /// Number of active players.
    pub fn total_players(&self) -> usize {
        self.roster.len()
    }
}
