//! Code pattern matching.
//!
//! Tests a code text against one category's indicator rules. A hit of any
//! rule in the list counts; the number of matches is deliberately ignored so
//! that verbose files don't outweigh terse ones. Indicator and fix lists may
//! overlap in surface form; the before/after text selection supplies the
//! semantic direction, not the matcher.

use crate::rules::{PatternRule, RuleSet};
use crate::types::Category;

/// Pattern matcher over the compiled rule table
#[derive(Debug)]
pub struct PatternMatcher<'r> {
    rules: &'r RuleSet,
}

impl<'r> PatternMatcher<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Ids of the vulnerability-indicator rules matching the code,
    /// in rule-table order
    pub fn vulnerability_hits(&self, category: Category, code: &str) -> Vec<String> {
        hits(&self.rules.for_category(category).vulnerable, code)
    }

    /// Ids of the fix-indicator rules matching the code
    pub fn fix_hits(&self, category: Category, code: &str) -> Vec<String> {
        hits(&self.rules.for_category(category).fixed, code)
    }

    pub fn has_vulnerability_indicator(&self, category: Category, code: &str) -> bool {
        self.rules
            .for_category(category)
            .vulnerable
            .iter()
            .any(|rule| rule.regex.is_match(code))
    }

    pub fn has_fix_indicator(&self, category: Category, code: &str) -> bool {
        self.rules.for_category(category).fixed.iter().any(|rule| rule.regex.is_match(code))
    }
}

fn hits(rules: &[PatternRule], code: &str) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.regex.is_match(code))
        .map(|rule| rule.id.clone())
        .collect()
}
