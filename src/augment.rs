//! Label-preserving augmentation.
//!
//! Derives new samples from frozen ones via textual transforms that keep the
//! category, the confidence score and the detected indicator hits unchanged:
//! consistent identifier renaming, comment insertion or removal, and
//! whitespace reformatting. The indicator invariant is enforced by re-running
//! the pattern matcher on every variant; a transform that changes the hit
//! set is discarded, not emitted. All transforms are deterministic so
//! augmented datasets reproduce exactly.

use crate::dedup::content_key;
use crate::matcher::PatternMatcher;
use crate::rules::RuleSet;
use crate::split::SplitDataset;
use crate::types::{Category, SampleRecord};
use crate::validate;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "var", "record", "yield", "true", "false", "null",
];

/// Augmenter over a shared rule table
#[derive(Debug)]
pub struct Augmenter<'r> {
    matcher: PatternMatcher<'r>,
    identifier: Regex,
}

impl<'r> Augmenter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            matcher: PatternMatcher::new(rules),
            identifier: Regex::new(r"\b[a-z][A-Za-z0-9_]*\b")
                .expect("identifier pattern is a fixed literal"),
        }
    }

    /// Produce the code of the `variant_index`-th variant of a frozen
    /// sample, or `None` when no transform survives the indicator
    /// self-check.
    pub fn variant(&self, sample: &SampleRecord, variant_index: usize) -> Option<String> {
        let category = Category::from_label(&sample.vulnerability_type)?;
        let code = &sample.vulnerable_code;
        let baseline = self.matcher.vulnerability_hits(category, code);

        for ident in self.rename_candidates(code) {
            let fresh = format!("{ident}Alt{variant_index}");
            if code.contains(&fresh) {
                continue;
            }

            let renamed = match Regex::new(&format!(r"\b{}\b", regex::escape(&ident))) {
                Ok(re) => re.replace_all(code, fresh.as_str()).into_owned(),
                Err(_) => continue,
            };
            let transformed = secondary_transform(&renamed, variant_index);

            // The invariant is checked, not assumed: the variant must report
            // the same indicator hits as its source and must not collapse to
            // the same normalized content.
            if self.matcher.vulnerability_hits(category, &transformed) == baseline
                && content_key(&transformed) != content_key(code)
            {
                return Some(transformed);
            }
            debug!(
                "transform of sample {} via '{ident}' broke the indicator set, discarding",
                sample.serial_no
            );
        }

        None
    }

    /// Grow each category to `target_per_category` samples by deriving
    /// variants, each placed in the split of its origin. Returns how many
    /// samples were added.
    pub fn balance(&self, split: &mut SplitDataset, target_per_category: usize) -> usize {
        let mut next_serial = split
            .named()
            .iter()
            .flat_map(|(_, part)| part.iter().map(|s| s.serial_no))
            .max()
            .unwrap_or(0)
            + 1;

        let mut seen: FxHashSet<String> = split
            .named()
            .iter()
            .flat_map(|(_, part)| part.iter().map(|s| content_key(&s.vulnerable_code)))
            .collect();

        let mut added = 0;
        for category in Category::ALL {
            // (split index, origin) pairs in serial order
            let mut origins: Vec<(usize, SampleRecord)> = Vec::new();
            for (part_index, (_, part)) in split.named().iter().enumerate() {
                for sample in part.iter() {
                    if sample.vulnerability_type == category.label() {
                        origins.push((part_index, sample.clone()));
                    }
                }
            }
            origins.sort_by_key(|(_, s)| s.serial_no);

            let mut count = origins.len();
            if count >= target_per_category {
                continue;
            }
            if origins.is_empty() {
                warn!("no {} originals to augment from", category.key());
                continue;
            }

            let mut uses_per_origin: FxHashMap<u32, usize> = FxHashMap::default();
            let mut cursor = 0;
            let mut stalled = 0;
            while count < target_per_category && stalled < origins.len() {
                let (part_index, origin) = &origins[cursor % origins.len()];
                cursor += 1;

                let variant_index = {
                    let uses = uses_per_origin.entry(origin.serial_no).or_insert(0);
                    *uses += 1;
                    *uses
                };

                match self.variant(origin, variant_index) {
                    Some(code) if seen.insert(content_key(&code)) => {
                        let record = SampleRecord {
                            serial_no: next_serial,
                            vulnerable_code: code,
                            ..origin.clone()
                        };
                        next_serial += 1;
                        count += 1;
                        added += 1;
                        stalled = 0;
                        match *part_index {
                            0 => split.train.push(record),
                            1 => split.val.push(record),
                            _ => split.test.push(record),
                        }
                    }
                    _ => stalled += 1,
                }
            }

            if count < target_per_category {
                warn!(
                    "augmentation of {} stalled at {count} of {target_per_category}",
                    category.key()
                );
            }
        }

        added
    }

    /// Identifiers eligible for renaming: lowercase-initial, at least three
    /// characters, not a keyword. Ordered by frequency, then name, so the
    /// choice is deterministic; unsuitable picks are weeded out by the
    /// indicator self-check.
    fn rename_candidates(&self, code: &str) -> Vec<String> {
        let stripped = validate::normalize(code);
        let mut freq: FxHashMap<&str, usize> = FxHashMap::default();
        for m in self.identifier.find_iter(&stripped) {
            let ident = m.as_str();
            if ident.len() >= 3 && !JAVA_KEYWORDS.contains(&ident) {
                *freq.entry(ident).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<(String, usize)> =
            freq.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.into_iter().map(|(ident, _)| ident).collect()
    }
}

/// Deterministic comment/whitespace transform cycle layered on top of the
/// rename
fn secondary_transform(code: &str, variant_index: usize) -> String {
    match variant_index % 3 {
        1 => format!("// reviewed snippet\n{code}"),
        2 => reindent(code),
        _ => code.to_string(),
    }
}

/// Replace tabs with four spaces and drop trailing blank lines
fn reindent(code: &str) -> String {
    let mut out: Vec<String> =
        code.lines().map(|line| line.replace('\t', "    ")).collect();
    while out.last().is_some_and(|line| line.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitRatios;
    use crate::split::stratified_split;

    fn sample(serial: u32, category: Category, code: &str) -> SampleRecord {
        SampleRecord {
            serial_no: serial,
            vulnerable_code: code.to_string(),
            vulnerability_type: category.label().to_string(),
            repo: "webapp".to_string(),
            commit: format!("{serial:040x}"),
            commit_msg: "fix, bug: 10".to_string(),
            original_file: "Dao.java".to_string(),
            confidence_score: 0.8,
        }
    }

    const SQL_SNIPPET: &str = r#"public List<User> find(String name) throws SQLException {
    Statement stmt = conn.createStatement();
    ResultSet rs = stmt.executeQuery("SELECT * FROM users WHERE name = '" + name + "'");
    return mapUsers(rs);
}"#;

    #[test]
    fn test_variant_preserves_indicator_hits() {
        let rules = RuleSet::builtin();
        let augmenter = Augmenter::new(&rules);
        let matcher = PatternMatcher::new(&rules);
        let origin = sample(1, Category::SqlInjection, SQL_SNIPPET);

        let baseline = matcher.vulnerability_hits(Category::SqlInjection, SQL_SNIPPET);
        assert!(!baseline.is_empty());

        for variant_index in 1..=3 {
            let code = augmenter.variant(&origin, variant_index).expect("variant");
            assert_ne!(code, SQL_SNIPPET);
            assert_eq!(
                matcher.vulnerability_hits(Category::SqlInjection, &code),
                baseline,
                "variant {variant_index}"
            );
            assert_ne!(content_key(&code), content_key(SQL_SNIPPET));
        }
    }

    #[test]
    fn test_rename_is_consistent() {
        let rules = RuleSet::builtin();
        let augmenter = Augmenter::new(&rules);
        let origin = sample(1, Category::SqlInjection, SQL_SNIPPET);

        let code = augmenter.variant(&origin, 3).expect("variant");
        // "name" is the most frequent eligible identifier; every occurrence
        // moves together
        assert!(!Regex::new(r"\bname\b").unwrap().is_match(&code));
        assert_eq!(code.matches("nameAlt3").count(), 3);
    }

    #[test]
    fn test_breaking_transform_is_discarded() {
        let rules = RuleSet::builtin();
        let augmenter = Augmenter::new(&rules);
        // The only eligible identifier is part of the indicator surface;
        // renaming it erases the hit, so no variant may be emitted.
        let origin = sample(1, Category::InsecureDeserialization, "in.readObject();");
        assert_eq!(augmenter.variant(&origin, 1), None);
    }

    #[test]
    fn test_balance_reaches_target_in_origin_split() {
        let rules = RuleSet::builtin();
        let augmenter = Augmenter::new(&rules);

        let samples: Vec<SampleRecord> = (1..=4)
            .map(|i| {
                sample(
                    i,
                    Category::SqlInjection,
                    &SQL_SNIPPET.replace("users", &format!("users_{i}")),
                )
            })
            .collect();
        let mut split = stratified_split(&samples, SplitRatios::default());
        assert_eq!(split.train.len(), 3);
        assert_eq!(split.val.len(), 1);

        let added = augmenter.balance(&mut split, 7);
        assert_eq!(added, 3);
        // Variants land in the split of their origin; the first three
        // origins in serial order are all in train
        assert_eq!(split.train.len(), 6);
        assert_eq!(split.val.len(), 1);
        assert!(split.test.is_empty());

        // Fresh, dense serials and untouched labels and scores
        let serials: Vec<u32> = split.train.iter().map(|s| s.serial_no).collect();
        assert_eq!(serials, vec![1, 2, 3, 5, 6, 7]);
        assert!(split
            .train
            .iter()
            .all(|s| s.vulnerability_type == "SQL Injection" && s.confidence_score == 0.8));
    }

    #[test]
    fn test_balance_without_originals_warns_and_skips() {
        let rules = RuleSet::builtin();
        let augmenter = Augmenter::new(&rules);
        let samples = vec![sample(1, Category::SqlInjection, SQL_SNIPPET)];
        let mut split = stratified_split(&samples, SplitRatios::default());

        let added = augmenter.balance(&mut split, 3);
        // Only SQL injection can grow; the other categories have no seeds
        assert_eq!(added, 2);
        assert_eq!(split.total(), 3);
    }
}
