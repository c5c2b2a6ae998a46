//! Dataset verification.
//!
//! Rechecks an emitted dataset against the published contract: closed-set
//! labels, quantized confidence scores consistent with the signals still
//! derivable from the stored fields, the indicator invariant, dedup
//! invariants, serial density and split stratification. Violations are
//! collected and reported, never panicked on; the caller decides to exit
//! non-zero.

use crate::config::SplitRatios;
use crate::dedup::content_key;
use crate::matcher::PatternMatcher;
use crate::rules::RuleSet;
use crate::score::ConfidenceScorer;
use crate::split::SplitDataset;
use crate::types::SampleRecord;
use rustc_hash::FxHashMap;
use std::fmt;

/// One failed check
#[derive(Debug, Clone)]
pub struct Violation {
    pub split: String,
    pub serial: Option<u32>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.serial {
            Some(serial) => write!(f, "{}#{}: {}", self.split, serial, self.message),
            None => write!(f, "{}: {}", self.split, self.message),
        }
    }
}

/// Options for dataset verification
#[derive(Debug, Clone, Copy)]
pub struct VerifyOptions {
    pub ratios: SplitRatios,
    /// Relax commit uniqueness for datasets that carry augmented variants,
    /// which intentionally share their origin's commit hash
    pub allow_augmented: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { ratios: SplitRatios::default(), allow_augmented: false }
    }
}

/// Verify every checkable dataset invariant, returning all violations
pub fn verify_dataset(
    split: &SplitDataset,
    rules: &RuleSet,
    options: &VerifyOptions,
) -> Vec<Violation> {
    let matcher = PatternMatcher::new(rules);
    let scorer = ConfidenceScorer::new();
    let mut violations = Vec::new();

    // Per-sample checks
    for (name, part) in split.named() {
        for sample in part {
            check_sample(name, sample, &matcher, &scorer, &mut violations);
        }
    }

    // Cross-sample checks
    check_uniqueness(split, options.allow_augmented, &mut violations);
    check_serial_density(split, &mut violations);
    // Stratification is a splitter invariant; balancing grows categories
    // inside their origin splits, which legitimately drifts the proportions
    if !options.allow_augmented {
        check_stratification(split, options.ratios, &mut violations);
    }

    violations
}

fn check_sample(
    split_name: &str,
    sample: &SampleRecord,
    matcher: &PatternMatcher<'_>,
    scorer: &ConfidenceScorer,
    violations: &mut Vec<Violation>,
) {
    let mut push = |message: String| {
        violations.push(Violation {
            split: split_name.to_string(),
            serial: Some(sample.serial_no),
            message,
        });
    };

    let Some(category) = sample.category() else {
        push(format!("unknown vulnerability_type '{}'", sample.vulnerability_type));
        return;
    };

    if sample.commit.len() != 40 || !sample.commit.chars().all(|c| c.is_ascii_hexdigit()) {
        push(format!("commit '{}' is not a 40-character hex hash", sample.commit));
    }

    // Scores are quantized by the fixed weighting
    let tenths = (sample.confidence_score * 10.0).round();
    let quantized = (sample.confidence_score * 10.0 - tenths).abs() < 1e-9;
    if !quantized || ![6.0, 8.0, 10.0].contains(&tenths) {
        push(format!("confidence_score {} outside {{0.6, 0.8, 1.0}}", sample.confidence_score));
        return;
    }

    // Recompute what the stored fields still determine: an accepted sample
    // had a real change and an indicator hit (0.6 floor), and message
    // strength is derivable from commit_msg. Only the fix-pattern term is
    // free, so a strong message forces at least 0.8 and a weak one caps the
    // score at 0.8.
    let strong = scorer.strong_message(&sample.commit_msg);
    if strong && tenths < 8.0 {
        push(format!(
            "score {} inconsistent with strong commit message (expected at least 0.8)",
            sample.confidence_score
        ));
    }
    if !strong && tenths > 8.0 {
        push(format!(
            "score {} inconsistent with weak commit message (expected at most 0.8)",
            sample.confidence_score
        ));
    }

    if !matcher.has_vulnerability_indicator(category, &sample.vulnerable_code) {
        push(format!("vulnerable_code matches no {category} indicator"));
    }
}

fn check_uniqueness(split: &SplitDataset, allow_augmented: bool, violations: &mut Vec<Violation>) {
    let mut content_seen: FxHashMap<String, (String, u32)> = FxHashMap::default();
    let mut commit_seen: FxHashMap<String, (String, u32)> = FxHashMap::default();

    for (name, part) in split.named() {
        for sample in part {
            let key = content_key(&sample.vulnerable_code);
            if let Some((first_split, first_serial)) =
                content_seen.insert(key, (name.to_string(), sample.serial_no))
            {
                violations.push(Violation {
                    split: name.to_string(),
                    serial: Some(sample.serial_no),
                    message: format!(
                        "normalized code duplicates {first_split}#{first_serial}"
                    ),
                });
            }

            if !allow_augmented {
                if let Some((first_split, first_serial)) = commit_seen
                    .insert(sample.commit.clone(), (name.to_string(), sample.serial_no))
                {
                    violations.push(Violation {
                        split: name.to_string(),
                        serial: Some(sample.serial_no),
                        message: format!("commit duplicates {first_split}#{first_serial}"),
                    });
                }
            }
        }
    }
}

fn check_serial_density(split: &SplitDataset, violations: &mut Vec<Violation>) {
    let mut serials: Vec<u32> = split
        .named()
        .iter()
        .flat_map(|(_, part)| part.iter().map(|s| s.serial_no))
        .collect();
    serials.sort_unstable();

    for (expected, &serial) in (1..).zip(serials.iter()) {
        if serial != expected {
            violations.push(Violation {
                split: "dataset".to_string(),
                serial: None,
                message: format!(
                    "serial numbers are not dense: expected {expected}, found {serial}"
                ),
            });
            return;
        }
    }
}

fn check_stratification(
    split: &SplitDataset,
    ratios: SplitRatios,
    violations: &mut Vec<Violation>,
) {
    let mut totals: FxHashMap<&str, usize> = FxHashMap::default();
    let mut per_split: FxHashMap<(&str, &str), usize> = FxHashMap::default();
    for (name, part) in split.named() {
        for sample in part {
            *totals.entry(sample.vulnerability_type.as_str()).or_insert(0) += 1;
            *per_split.entry((name, sample.vulnerability_type.as_str())).or_insert(0) += 1;
        }
    }

    for (label, &total) in &totals {
        for (name, ratio) in [("train", ratios.train), ("val", ratios.val), ("test", ratios.test)]
        {
            let count = per_split.get(&(name, *label)).copied().unwrap_or(0);
            let expected = total as f64 * ratio;
            if (count as f64 - expected).abs() > 1.0 {
                violations.push(Violation {
                    split: name.to_string(),
                    serial: None,
                    message: format!(
                        "{label}: {count} samples, expected about {expected:.1} of {total}"
                    ),
                });
            }
        }
    }
}
