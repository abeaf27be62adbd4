//! Keyword rule table for sorting records into categories

use crate::error::{Error, Result};
use crate::types::ATTACHMENTS_DIR;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Category assigned when no rule matches
pub const FALLBACK_CATEGORY: &str = "Other";

/// One named category and the keywords that select it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Ordered category rules; the first category with a matching keyword wins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryTable {
    pub categories: Vec<Category>,

    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    FALLBACK_CATEGORY.to_string()
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "Orders",
                &[
                    "order",
                    "receipt",
                    "invoice",
                    "purchase",
                    "payment",
                    "confirmed",
                    "confirmation",
                    "booking",
                    "reserved",
                ],
            ),
            Category::new(
                "Delivery",
                &[
                    "shipped",
                    "tracking",
                    "delivery",
                    "delivered",
                    "arriving",
                    "scheduled",
                    "shipment",
                    "way",
                ],
            ),
            Category::new(
                "Promotions",
                &[
                    "sale",
                    "off",
                    "%",
                    "deal",
                    "newsletter",
                    "exclusive",
                    "limited",
                    "save",
                    "offer",
                    "rewards",
                ],
            ),
        ])
    }
}

impl CategoryTable {
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            fallback: default_fallback(),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Parse a table from JSON: `{"categories": [{"name": .., "keywords": [..]}], "fallback": ..}`.
    ///
    /// Category order in the document is match order.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json).map_err(|e| Error::Rules(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&json)
    }

    // Category names become folder names
    fn validate(&self) -> Result<()> {
        let names = self.categories.iter().map(|c| c.name.as_str());
        for name in names.chain(std::iter::once(self.fallback.as_str())) {
            if name.is_empty()
                || name == "."
                || name == ".."
                || name == ATTACHMENTS_DIR
                || name.contains(['/', '\\'])
            {
                return Err(Error::Rules(format!("unusable category name {name:?}")));
            }
        }
        Ok(())
    }

    /// Category for a record's file name.
    ///
    /// Case-insensitive substring match of each keyword against `filename`,
    /// in table order then keyword order. Only the name is inspected.
    #[must_use]
    pub fn classify(&self, filename: &str) -> &str {
        let filename = filename.to_lowercase();

        self.categories
            .iter()
            .find(|category| {
                category
                    .keywords
                    .iter()
                    .any(|keyword| filename.contains(&keyword.to_lowercase()))
            })
            .map_or(self.fallback.as_str(), |category| category.name.as_str())
    }
}
