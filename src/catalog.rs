//! Category catalog: the ordered set of spending categories used for
//! classification, with a guaranteed catch-all bucket.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

pub const CATCH_ALL: &str = "Extra";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    catch_all: String,
}

// (name, description). The description doubles as classification guidance and
// as a keyword source for the rule-based fallback.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "Restaurants, groceries, food delivery"),
    ("Transport", "Uber, taxi, auto, fuel, public transport"),
    ("Shopping", "Clothes, electronics, online shopping"),
    ("Bills", "Electricity, water, internet, mobile recharge"),
    ("Entertainment", "Movies, games, subscriptions"),
    ("Health", "Medical, fitness, pharmacy"),
    ("Education", "Books, courses, tuition"),
    ("Home & Tax", "Rent, maintenance, repairs, taxes"),
    (CATCH_ALL, "Miscellaneous expenses"),
];

impl Catalog {
    /// Build a catalog, appending the catch-all category if it is missing.
    pub fn from_categories(mut categories: Vec<Category>) -> Self {
        if !categories
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(CATCH_ALL))
        {
            categories.push(Category {
                name: CATCH_ALL.to_string(),
                description: "Miscellaneous expenses".to_string(),
            });
        }
        Self {
            categories,
            catch_all: CATCH_ALL.to_string(),
        }
    }

    pub fn default_catalog() -> Self {
        Self::from_categories(
            DEFAULT_CATEGORIES
                .iter()
                .map(|(name, description)| Category {
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        )
    }

    /// Load the catalog file, falling back to the built-in default when the
    /// file is absent or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<Category>>(&content) {
                Ok(categories) if !categories.is_empty() => Self::from_categories(categories),
                Ok(_) => Self::default_catalog(),
                Err(e) => {
                    warn!("unreadable catalog {}: {e}, using defaults", path.display());
                    Self::default_catalog()
                }
            },
            Err(_) => Self::default_catalog(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.categories)?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn catch_all(&self) -> &str {
        &self.catch_all
    }

    /// Resolve a classifier-returned name to the canonical catalog name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .map(|c| c.name.as_str())
    }
}
