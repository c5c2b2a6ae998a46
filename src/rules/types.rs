//! Raw YAML shapes for the category rule table.
//!
//! These structs mirror the on-disk format exactly; compilation and
//! validation into usable matchers happens in the parent module.

use serde::Deserialize;

/// Top-level rule table file
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTableSpec {
    pub categories: Vec<CategorySpec>,
}

/// One vulnerability category's matching rules
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySpec {
    /// Stable key, must match one of the closed-set category keys
    pub key: String,
    /// Published label, must match the category's verbatim label
    pub label: String,
    /// Lowercase commit-message phrases, tested as substrings
    pub keywords: Vec<String>,
    /// Vulnerability indicators, tested against the "before" text
    pub vulnerable: Vec<PatternSpec>,
    /// Fix indicators, tested against the "after" text
    pub fixed: Vec<PatternSpec>,
}

/// A single regex rule
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSpec {
    /// Short slug, unique within its category and direction
    pub id: String,
    pub desc: String,
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: bool,
}
