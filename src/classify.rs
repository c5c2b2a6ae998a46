//! Commit-message classification.
//!
//! Maps a commit message to at most one vulnerability category by keyword
//! matching. Ties are resolved by declared category order, not by match
//! count; a commit with no hit is dropped from further processing, which is
//! a filtering outcome and never an error.

use crate::rules::RuleSet;
use crate::types::Category;

/// Keyword classifier over the rule table's message phrases
#[derive(Debug)]
pub struct MessageClassifier<'r> {
    rules: &'r RuleSet,
}

impl<'r> MessageClassifier<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Return the first category (in declared priority order) with any
    /// keyword phrase present in the case-folded message
    pub fn classify(&self, message: &str) -> Option<Category> {
        let folded = message.to_lowercase();
        self.rules
            .categories()
            .iter()
            .find(|rules| rules.keywords.iter().any(|k| folded.contains(k.as_str())))
            .map(|rules| rules.category)
    }
}
