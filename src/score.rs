//! Confidence scoring.
//!
//! Combines the four stage signals into a fixed linear weighting:
//! `0.3·real_change + 0.3·vuln_pattern + 0.2·fix_pattern + 0.2·strong_message`,
//! each term either its full weight or zero. The weights and the 0.6
//! acceptance cutoff are part of the published dataset contract and must not
//! be renormalized. Scores are computed in integer tenths so equal-looking
//! floats really are equal.

use crate::types::ScoreSignals;
use regex::Regex;

/// Scoring weights, in tenths
const WEIGHT_REAL_CHANGE: u32 = 3;
const WEIGHT_VULN_PATTERN: u32 = 3;
const WEIGHT_FIX_PATTERN: u32 = 2;
const WEIGHT_STRONG_MESSAGE: u32 = 2;

/// Security keywords whose presence marks a commit message as strong
const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "vulnerab",
    "exploit",
    "attack",
    "sanitiz",
    "injection",
    "xss",
    "csrf",
    "traversal",
    "unsafe",
    "malicious",
    "harden",
];

/// Issue-tracker domain tokens recognized in commit messages
const TRACKER_DOMAINS: &[&str] = &[
    "github.com/",
    "gitlab.com/",
    "issues.apache.org",
    "bugzilla.",
    "jira.",
    "sourceforge.net",
];

/// Scorer with its compiled message-strength patterns
#[derive(Debug)]
pub struct ConfidenceScorer {
    bug_reference: Regex,
    cve_reference: Regex,
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        // Labeled integer ids: "bug: 41970", "fixes #123", "JIRA-4521"
        let bug_reference = Regex::new(
            r"(?i)\b(?:bug|issue|ticket|fix(?:es)?|close[sd]?|resolve[sd]?|gh|jira)\s*[:#-]?\s*\d{2,}",
        )
        .expect("bug reference pattern is a fixed literal");
        let cve_reference =
            Regex::new(r"(?i)\bCVE-\d{4}-\d{4,}").expect("CVE pattern is a fixed literal");
        Self { bug_reference, cve_reference }
    }

    /// A message is strong if it carries a labeled bug/ticket/CVE id, a
    /// security keyword, or a known issue-tracker domain
    pub fn strong_message(&self, message: &str) -> bool {
        if self.bug_reference.is_match(message) || self.cve_reference.is_match(message) {
            return true;
        }
        let folded = message.to_lowercase();
        SECURITY_KEYWORDS.iter().any(|k| folded.contains(k))
            || TRACKER_DOMAINS.iter().any(|d| folded.contains(d))
    }

    /// Combine the signals into a score in [0, 1]
    pub fn score(&self, signals: ScoreSignals) -> f64 {
        let mut tenths = 0;
        if signals.real_change {
            tenths += WEIGHT_REAL_CHANGE;
        }
        if signals.vuln_pattern {
            tenths += WEIGHT_VULN_PATTERN;
        }
        if signals.fix_pattern {
            tenths += WEIGHT_FIX_PATTERN;
        }
        if signals.strong_message {
            tenths += WEIGHT_STRONG_MESSAGE;
        }
        f64::from(tenths) / 10.0
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}
