//! Enumeration types for the Dinotrack census.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Species category
// ---------------------------------------------------------------------------

/// Diet category a canonical species belongs to.
///
/// Categories drive the grouping of the status board. Species that the
/// catalog does not know are `Uncategorized` until the catalog is updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Meat eaters.
    Carnivore,
    /// Plant eaters.
    Herbivore,
    /// Mixed diet.
    Omnivore,
    /// Not listed in the known-species catalog.
    Uncategorized,
}

impl Category {
    /// All categories in status-board order.
    pub const ALL: [Self; 4] = [
        Self::Carnivore,
        Self::Herbivore,
        Self::Omnivore,
        Self::Uncategorized,
    ];

    /// Section heading used by the status board.
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Carnivore => "Carnivores",
            Self::Herbivore => "Herbivores",
            Self::Omnivore => "Omnivores",
            Self::Uncategorized => "Other",
        }
    }
}

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Gender of a creature, as reported by the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male creature.
    Male,
    /// Female creature.
    Female,
}

impl Gender {
    /// Parse the gender token used in server logs (case-insensitive).
    ///
    /// Returns `None` for anything other than `male` or `female`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

impl core::fmt::Display for Gender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
        }
    }
}
