//! Raw creature class names to canonical species names.
//!
//! The game server reports internal engine class names such as
//! `BP_Carno_C`. Normalization strips the engine prefix and suffix, maps
//! the remainder through the catalog alias table, and falls back to the
//! stripped value itself. It never fails: a species that appears before
//! the catalog is updated passes through verbatim as `Uncategorized`.

use std::sync::Arc;

use dinotrack_types::Category;

use crate::catalog::KnownSpeciesCatalog;

/// Canonical name used when the server reports no species at all.
pub const UNKNOWN_SPECIES: &str = "Unknown";

/// Result of normalizing a raw class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSpecies {
    /// Canonical species name used for counting and display.
    pub canonical: String,
    /// Category of the canonical species.
    pub category: Category,
}

/// Deterministic, total mapping from raw class names to canonical species.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    catalog: Arc<KnownSpeciesCatalog>,
}

impl NameNormalizer {
    /// Create a normalizer backed by the given catalog.
    pub const fn new(catalog: Arc<KnownSpeciesCatalog>) -> Self {
        Self { catalog }
    }

    /// The catalog this normalizer reads.
    pub fn catalog(&self) -> &KnownSpeciesCatalog {
        &self.catalog
    }

    /// Normalize a raw class name.
    ///
    /// Empty input (or input that is empty once prefix and suffix are
    /// stripped) yields [`UNKNOWN_SPECIES`].
    pub fn normalize(&self, raw: &str) -> NormalizedSpecies {
        let stripped = self.strip(raw.trim());
        if stripped.is_empty() {
            return NormalizedSpecies {
                canonical: UNKNOWN_SPECIES.to_owned(),
                category: Category::Uncategorized,
            };
        }

        let canonical = self.catalog.alias(stripped).unwrap_or(stripped);
        NormalizedSpecies {
            canonical: canonical.to_owned(),
            category: self.catalog.category_of(canonical),
        }
    }

    fn strip<'a>(&self, raw: &'a str) -> &'a str {
        let without_prefix = raw
            .strip_prefix(self.catalog.class_prefix.as_str())
            .unwrap_or(raw);
        without_prefix
            .strip_suffix(self.catalog.class_suffix.as_str())
            .unwrap_or(without_prefix)
    }
}
