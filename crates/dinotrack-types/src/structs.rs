//! Core data structs: player sessions and the raw observations they are
//! built from.

use serde::{Deserialize, Serialize};

use crate::enums::{Category, Gender};
use crate::ids::PlayerId;

// ---------------------------------------------------------------------------
// Raw observations
// ---------------------------------------------------------------------------

/// One entry of a full player-list query: who is connected right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerListing {
    /// Stable player identifier.
    pub player_id: PlayerId,
    /// Name shown in game. Used to query player detail.
    pub display_name: String,
}

/// Creature vitals reported by a player-detail query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Health fraction.
    pub health: f32,
    /// Stamina fraction.
    pub stamina: f32,
    /// Hunger fraction.
    pub hunger: f32,
    /// Thirst fraction.
    pub thirst: f32,
}

/// Result of a successful per-player detail query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetail {
    /// Internal creature class name, before normalization (e.g. `BP_Carno_C`).
    pub species_raw: String,
    /// Growth in `[0.0, 1.0]`.
    pub growth: f32,
    /// Gender, when the query reports it.
    pub gender: Option<Gender>,
    /// Vitals, when the query reports them.
    pub vitals: Option<Vitals>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One active player-creature binding tracked in the roster.
///
/// A `player_id` appears in at most one session at a time. Growth is
/// expected to be non-decreasing while the species stays the same; it
/// resets only when the player switches species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSession {
    /// Unique roster key.
    pub player_id: PlayerId,
    /// Informational name, not a key.
    pub display_name: String,
    /// Canonical species name (post-normalization).
    pub species: String,
    /// Category of `species` according to the catalog.
    pub category: Category,
    /// Growth in `[0.0, 1.0]`.
    pub growth: f32,
    /// Gender. Only the event-tail variant observes it.
    pub gender: Option<Gender>,
    /// Last observed vitals. Only the snapshot variant observes them.
    pub vitals: Option<Vitals>,
}
