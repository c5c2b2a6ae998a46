//! Category rule tables.
//!
//! Each vulnerability category owns three ordered rule lists: commit-message
//! keyword phrases (classifier), vulnerability-indicator patterns (tested
//! against the "before" text) and fix-indicator patterns (tested against the
//! "after" text). The lists live in a YAML data table so categories can be
//! added or tuned without touching control flow; loading validates the table
//! against the closed category set and compiles every pattern up front.

mod types;

pub use types::{CategorySpec, PatternSpec, RuleTableSpec};

use crate::error::{QuarryError, Result};
use crate::types::Category;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The built-in rule table, embedded at compile time
const BUILTIN_RULES: &str = include_str!("categories.yaml");

/// A compiled regex rule with its fully-qualified id,
/// e.g. `sql_injection/vuln/concat-execute`
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub id: String,
    pub desc: String,
    pub regex: Regex,
}

/// One category's compiled rules
#[derive(Debug, Clone)]
pub struct CategoryRules {
    pub category: Category,
    pub keywords: Vec<String>,
    pub vulnerable: Vec<PatternRule>,
    pub fixed: Vec<PatternRule>,
}

/// The full compiled rule table, one entry per category in declared
/// (priority) order
#[derive(Debug, Clone)]
pub struct RuleSet {
    categories: Vec<CategoryRules>,
}

impl RuleSet {
    /// Load the embedded default table.
    ///
    /// The embedded table is validated by this crate's tests, so a failure
    /// here is a build defect rather than a runtime condition.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_yaml_str(BUILTIN_RULES).expect("embedded category rule table must be valid")
    }

    /// Load and validate a custom rule table from a YAML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            QuarryError::rule_loading(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml).map_err(|e| match e {
            QuarryError::RuleLoading { message } => {
                QuarryError::rule_loading(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Parse, validate and compile a rule table from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let spec: RuleTableSpec = serde_yaml::from_str(yaml).map_err(|e| {
            let location = e
                .location()
                .map(|l| format!(" (line {}, column {})", l.line(), l.column()))
                .unwrap_or_default();
            QuarryError::rule_loading(format!("invalid YAML{location}: {e}"))
        })?;
        Self::compile(spec)
    }

    fn compile(spec: RuleTableSpec) -> Result<Self> {
        let mut by_category: Vec<Option<CategoryRules>> = vec![None; Category::ALL.len()];

        for cat_spec in &spec.categories {
            let category = Category::from_key(&cat_spec.key).ok_or_else(|| {
                QuarryError::rule_loading(format!("unknown category key '{}'", cat_spec.key))
            })?;

            if cat_spec.label != category.label() {
                return Err(QuarryError::rule_loading(format!(
                    "category '{}' must use label '{}', got '{}'",
                    cat_spec.key,
                    category.label(),
                    cat_spec.label
                )));
            }

            let slot = category as usize;
            if by_category[slot].is_some() {
                return Err(QuarryError::rule_loading(format!(
                    "duplicate category '{}'",
                    cat_spec.key
                )));
            }

            if cat_spec.keywords.is_empty() {
                return Err(QuarryError::rule_loading(format!(
                    "category '{}' has no keywords",
                    cat_spec.key
                )));
            }
            for keyword in &cat_spec.keywords {
                if keyword.chars().any(|c| c.is_uppercase()) {
                    return Err(QuarryError::rule_loading(format!(
                        "keyword '{keyword}' in '{}' must be lowercase (messages are case-folded)",
                        cat_spec.key
                    )));
                }
            }

            let vulnerable = compile_rules(&cat_spec.key, "vuln", &cat_spec.vulnerable)?;
            let fixed = compile_rules(&cat_spec.key, "fix", &cat_spec.fixed)?;
            if vulnerable.is_empty() || fixed.is_empty() {
                return Err(QuarryError::rule_loading(format!(
                    "category '{}' needs at least one vulnerable and one fixed pattern",
                    cat_spec.key
                )));
            }

            debug!(
                "compiled {}: {} keywords, {} vulnerable, {} fixed",
                cat_spec.key,
                cat_spec.keywords.len(),
                vulnerable.len(),
                fixed.len()
            );

            by_category[slot] = Some(CategoryRules {
                category,
                keywords: cat_spec.keywords.clone(),
                vulnerable,
                fixed,
            });
        }

        let mut categories = Vec::with_capacity(Category::ALL.len());
        for (slot, rules) in by_category.into_iter().enumerate() {
            match rules {
                Some(rules) => categories.push(rules),
                None => {
                    return Err(QuarryError::rule_loading(format!(
                        "rule table is missing category '{}'",
                        Category::ALL[slot].key()
                    )))
                }
            }
        }

        Ok(Self { categories })
    }

    /// All categories in declared (priority) order
    pub fn categories(&self) -> &[CategoryRules] {
        &self.categories
    }

    /// The compiled rules for one category
    pub fn for_category(&self, category: Category) -> &CategoryRules {
        &self.categories[category as usize]
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn compile_rules(category_key: &str, direction: &str, specs: &[PatternSpec]) -> Result<Vec<PatternRule>> {
    let mut seen_ids = FxHashSet::default();
    let mut rules = Vec::with_capacity(specs.len());

    for spec in specs {
        let id = format!("{category_key}/{direction}/{}", spec.id);
        if !seen_ids.insert(id.clone()) {
            return Err(QuarryError::rule_loading(format!("duplicate rule id '{id}'")));
        }

        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(spec.case_insensitive)
            .build()
            .map_err(|e| {
                QuarryError::rule_loading(format!("rule '{id}' has an invalid pattern: {e}"))
            })?;

        rules.push(PatternRule { id, desc: spec.desc.clone(), regex });
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_compiles() {
        let rules = RuleSet::builtin();
        assert_eq!(rules.categories().len(), Category::ALL.len());
        for (rules, expected) in rules.categories().iter().zip(Category::ALL) {
            assert_eq!(rules.category, expected);
            assert!(!rules.keywords.is_empty());
            assert!(!rules.vulnerable.is_empty());
            assert!(!rules.fixed.is_empty());
        }
    }

    #[test]
    fn test_rule_ids_are_qualified() {
        let rules = RuleSet::builtin();
        let sql = rules.for_category(Category::SqlInjection);
        assert!(sql.vulnerable.iter().all(|r| r.id.starts_with("sql_injection/vuln/")));
        assert!(sql.fixed.iter().all(|r| r.id.starts_with("sql_injection/fix/")));
    }

    #[test]
    fn test_missing_category_rejected() {
        let yaml = r#"
categories:
  - key: sql_injection
    label: 'SQL Injection'
    keywords: [sqli]
    vulnerable:
      - { id: a, desc: a, pattern: 'executeQuery' }
    fixed:
      - { id: b, desc: b, pattern: 'prepareStatement' }
"#;
        let err = RuleSet::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("missing category"));
    }

    #[test]
    fn test_wrong_label_rejected() {
        let yaml = r#"
categories:
  - key: sql_injection
    label: 'SQLi'
    keywords: [sqli]
    vulnerable:
      - { id: a, desc: a, pattern: 'x' }
    fixed:
      - { id: b, desc: b, pattern: 'y' }
"#;
        let err = RuleSet::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("must use label"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let yaml = r#"
categories:
  - key: sql_injection
    label: 'SQL Injection'
    keywords: [sqli]
    vulnerable:
      - { id: a, desc: a, pattern: '([unclosed' }
    fixed:
      - { id: b, desc: b, pattern: 'y' }
"#;
        let err = RuleSet::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_uppercase_keyword_rejected() {
        let yaml = r#"
categories:
  - key: sql_injection
    label: 'SQL Injection'
    keywords: ['SQL Injection']
    vulnerable:
      - { id: a, desc: a, pattern: 'x' }
    fixed:
      - { id: b, desc: b, pattern: 'y' }
"#;
        assert!(RuleSet::from_yaml_str(yaml).is_err());
    }
}
