//! The periodically refreshed status board.
//!
//! Counts are grouped by category in catalog order: carnivores, herbivores,
//! omnivores, then any species the catalog does not know under "Other" in
//! name order. Whether zero counts are listed follows the census
//! zero-count policy.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use dinotrack_census::{KnownSpeciesCatalog, ZeroCountPolicy};
use dinotrack_types::Category;
use serde::Serialize;

use crate::view::CensusView;

/// Title shown above the board.
pub const STATUS_TITLE: &str = "Active Dinosaurs";

/// One species line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// Canonical species name.
    pub species: String,
    /// Active players controlling it.
    pub count: u32,
}

/// One category block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSection {
    /// The category.
    pub category: Category,
    /// Display heading.
    pub heading: &'static str,
    /// Species lines in display order.
    pub entries: Vec<StatusEntry>,
}

/// Status board built from a published view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBoard {
    /// Tick the view was published at.
    pub tick: u64,
    /// Number of active players.
    pub total_players: usize,
    /// Category blocks. Catalog categories are always present; "Other"
    /// only when it has entries.
    pub sections: Vec<StatusSection>,
    /// When the underlying view was published.
    pub updated_at: DateTime<Utc>,
}

impl StatusBoard {
    /// Group the view's census by category.
    pub fn build(view: &CensusView, catalog: &KnownSpeciesCatalog) -> Self {
        let listed = |count: u32| count > 0 || view.policy() == ZeroCountPolicy::Retain;
        let mut sections = Vec::with_capacity(Category::ALL.len());

        for category in Category::ALL {
            let entries: Vec<StatusEntry> = if category == Category::Uncategorized {
                view.census
                    .iter()
                    .filter(|(species, _)| catalog.category_of(species) == Category::Uncategorized)
                    .filter(|(_, count)| listed(*count))
                    .map(|(species, count)| StatusEntry {
                        species: species.to_owned(),
                        count,
                    })
                    .collect()
            } else {
                catalog
                    .species(category)
                    .iter()
                    .map(|species| StatusEntry {
                        species: species.clone(),
                        count: view.census.get(species),
                    })
                    .filter(|entry| listed(entry.count))
                    .collect()
            };

            if category == Category::Uncategorized && entries.is_empty() {
                continue;
            }
            sections.push(StatusSection {
                category,
                heading: category.heading(),
                entries,
            });
        }

        Self {
            tick: view.tick,
            total_players: view.total_players(),
            sections,
            updated_at: view.updated_at,
        }
    }

    /// Render as plain text for logs and chat.
    pub fn render_text(&self) -> String {
        let mut out = format!("{STATUS_TITLE}\nTotal Players: {}\n", self.total_players);
        for section in &self.sections {
            let _ = write!(out, "\n{}\n", section.heading);
            if section.entries.is_empty() {
                out.push_str("  none\n");
            }
            for entry in &section.entries {
                let _ = writeln!(out, "  {}: {}", entry.species, entry.count);
            }
        }
        let _ = write!(
            out,
            "\nLast updated: {}",
            self.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        out
    }
}
