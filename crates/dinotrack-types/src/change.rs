//! Change records emitted by a reconciliation tick.
//!
//! A [`ChangeRecord`] is produced transiently for every roster mutation the
//! notifier should hear about, in the order the mutations were applied. It
//! is not retained by the census. Besides the identifying fields each
//! variant carries the presentation fields needed to render a chat line.

use serde::{Deserialize, Serialize};

use crate::enums::Gender;
use crate::ids::PlayerId;

/// Something that happened to the roster since the previous tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeRecord {
    /// A player id was observed for the first time.
    Joined {
        /// The joining player.
        player_id: PlayerId,
        /// Display name at join time.
        display_name: String,
        /// Canonical species.
        species: String,
        /// Whether the creature was freshly created (no prior save).
        fresh_spawn: bool,
        /// Gender, when observed.
        gender: Option<Gender>,
        /// Growth at join time.
        growth: f32,
    },
    /// A tracked player disappeared.
    Left {
        /// The departing player.
        player_id: PlayerId,
        /// Display name of the removed session.
        display_name: String,
        /// Species of the removed session.
        species: String,
        /// Growth at the time of leaving.
        growth: f32,
    },
    /// A tracked player switched to a different species.
    ChangedSpecies {
        /// The player.
        player_id: PlayerId,
        /// Display name.
        display_name: String,
        /// Previous canonical species.
        from: String,
        /// New canonical species.
        to: String,
        /// Gender, when observed.
        gender: Option<Gender>,
        /// Growth of the new creature.
        growth: f32,
    },
}

impl ChangeRecord {
    /// The player the record is about.
    pub const fn player_id(&self) -> &PlayerId {
        match self {
            Self::Joined { player_id, .. }
            | Self::Left { player_id, .. }
            | Self::ChangedSpecies { player_id, .. } => player_id,
        }
    }
}
