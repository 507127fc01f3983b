//! Static reference data: known species per category and the alias table.
//!
//! The catalog is loaded once at process start and never mutated. Its
//! per-category ordering is the ordering of the status board. The alias
//! table maps the stripped internal class names the game server reports
//! (`Carno`, `Stego`, ...) to canonical species names.

use std::collections::BTreeMap;

use dinotrack_types::Category;
use serde::{Deserialize, Serialize};

/// Internal engine prefix on creature class names.
pub const DEFAULT_CLASS_PREFIX: &str = "BP_";

/// Internal engine suffix on creature class names.
pub const DEFAULT_CLASS_SUFFIX: &str = "_C";

const CARNIVORES: [&str; 8] = [
    "Omniraptor",
    "Carnotaurus",
    "Ceratosaurus",
    "Dilophosaurus",
    "Herrerasaurus",
    "Troodon",
    "Deinosuchus",
    "Pteranodon",
];

const HERBIVORES: [&str; 7] = [
    "Stegosaurus",
    "Dryosaurus",
    "Tenontosaurus",
    "Hypsilophodon",
    "Pachycephalosaurus",
    "Maiasaura",
    "Diabloceratops",
];

const OMNIVORES: [&str; 2] = ["Gallimimus", "Beipiaosaurus"];

const ALIASES: [(&str, &str); 17] = [
    ("Utah", "Omniraptor"),
    ("Utahraptor", "Omniraptor"),
    ("Carno", "Carnotaurus"),
    ("Cerato", "Ceratosaurus"),
    ("Dilo", "Dilophosaurus"),
    ("Herrera", "Herrerasaurus"),
    ("Deino", "Deinosuchus"),
    ("Ptera", "Pteranodon"),
    ("Stego", "Stegosaurus"),
    ("Dryo", "Dryosaurus"),
    ("Teno", "Tenontosaurus"),
    ("Hypsi", "Hypsilophodon"),
    ("Pachy", "Pachycephalosaurus"),
    ("Maia", "Maiasaura"),
    ("Diablo", "Diabloceratops"),
    ("Beipi", "Beipiaosaurus"),
    ("Galli", "Gallimimus"),
];

/// Ordered species lists per category plus the raw-name alias table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSpeciesCatalog {
    /// Carnivores in display order.
    #[serde(default)]
    pub carnivores: Vec<String>,
    /// Herbivores in display order.
    #[serde(default)]
    pub herbivores: Vec<String>,
    /// Omnivores in display order.
    #[serde(default)]
    pub omnivores: Vec<String>,
    /// Stripped class name to canonical species name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Prefix removed from raw class names before alias lookup.
    #[serde(default = "default_prefix")]
    pub class_prefix: String,
    /// Suffix removed from raw class names before alias lookup.
    #[serde(default = "default_suffix")]
    pub class_suffix: String,
}

impl KnownSpeciesCatalog {
    /// The catalog of the species currently playable on Evrima servers.
    pub fn builtin() -> Self {
        Self {
            carnivores: CARNIVORES.iter().map(|s| (*s).to_owned()).collect(),
            herbivores: HERBIVORES.iter().map(|s| (*s).to_owned()).collect(),
            omnivores: OMNIVORES.iter().map(|s| (*s).to_owned()).collect(),
            aliases: ALIASES
                .iter()
                .map(|(raw, canonical)| ((*raw).to_owned(), (*canonical).to_owned()))
                .collect(),
            class_prefix: default_prefix(),
            class_suffix: default_suffix(),
        }
    }

    /// Species of one category in display order.
    ///
    /// `Uncategorized` has no catalog entries by definition.
    pub fn species(&self, category: Category) -> &[String] {
        match category {
            Category::Carnivore => &self.carnivores,
            Category::Herbivore => &self.herbivores,
            Category::Omnivore => &self.omnivores,
            Category::Uncategorized => &[],
        }
    }

    /// Category of a canonical species name.
    pub fn category_of(&self, canonical: &str) -> Category {
        [Category::Carnivore, Category::Herbivore, Category::Omnivore]
            .into_iter()
            .find(|category| self.species(*category).iter().any(|s| s == canonical))
            .unwrap_or(Category::Uncategorized)
    }

    /// Look up the canonical name for a stripped class name.
    pub fn alias(&self, stripped: &str) -> Option<&str> {
        self.aliases.get(stripped).map(String::as_str)
    }

    /// Total number of catalogued species across all categories.
    pub fn len(&self) -> usize {
        self.carnivores
            .len()
            .saturating_add(self.herbivores.len())
            .saturating_add(self.omnivores.len())
    }

    /// Return whether the catalog lists no species at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KnownSpeciesCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn default_prefix() -> String {
    DEFAULT_CLASS_PREFIX.to_owned()
}

fn default_suffix() -> String {
    DEFAULT_CLASS_SUFFIX.to_owned()
}
