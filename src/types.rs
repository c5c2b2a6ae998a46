//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// One file's before/after text within a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub before: String,
    pub after: String,
}

/// A materialized commit from the history store. Immutable once read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    /// 40-character lowercase hex, unique per commit
    pub hash: String,
    /// Short repository name
    pub repo: String,
    pub message: String,
    pub files: Vec<FileDiff>,
}

impl CommitRecord {
    /// Check that the commit hash is well-formed (40 hex characters)
    pub fn has_valid_hash(&self) -> bool {
        self.hash.len() == 40 && self.hash.chars().all(|c| c.is_ascii_hexdigit())
    }
}

/// Closed set of vulnerability categories.
///
/// Declared order is the classifier priority order: when a commit message
/// matches keywords of several categories, the first declared one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    SqlInjection,
    CrossSiteScripting,
    CommandInjection,
    PathTraversal,
    InsecureDeserialization,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::SqlInjection,
        Category::CrossSiteScripting,
        Category::CommandInjection,
        Category::PathTraversal,
        Category::InsecureDeserialization,
    ];

    /// The published dataset label, verbatim
    pub fn label(&self) -> &'static str {
        match self {
            Category::SqlInjection => "SQL Injection",
            Category::CrossSiteScripting => "Cross-Site Scripting (XSS)",
            Category::CommandInjection => "Command Injection",
            Category::PathTraversal => "Path Traversal",
            Category::InsecureDeserialization => "Insecure Deserialization",
        }
    }

    /// Stable lowercase key used in rule tables and statistics
    pub fn key(&self) -> &'static str {
        match self {
            Category::SqlInjection => "sql_injection",
            Category::CrossSiteScripting => "cross_site_scripting",
            Category::CommandInjection => "command_injection",
            Category::PathTraversal => "path_traversal",
            Category::InsecureDeserialization => "insecure_deserialization",
        }
    }

    /// Parse a published label back into the closed set. Consumers must
    /// reject unknown values, so this is deliberately exact-match.
    pub fn from_label(label: &str) -> Option<Self> {
        Category::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Parse a rule-table key
    pub fn from_key(key: &str) -> Option<Self> {
        Category::ALL.iter().copied().find(|c| c.key() == key)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The four boolean signals feeding the confidence scorer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSignals {
    pub real_change: bool,
    pub vuln_pattern: bool,
    pub fix_pattern: bool,
    pub strong_message: bool,
}

/// A candidate flowing through the pipeline before acceptance.
///
/// Created once from a (commit, file diff, category) triple, scored once,
/// and either discarded or frozen into a `SampleRecord`.
#[derive(Debug, Clone)]
pub struct CandidateSample {
    pub category: Category,
    /// The "before" blob: the vulnerable version of the file
    pub code: String,
    pub repo: String,
    pub commit: String,
    pub message: String,
    /// Filename only, path components stripped
    pub file_name: String,
    pub signals: ScoreSignals,
    pub score: f64,
    /// Ids of the vulnerability-indicator rules that matched the before text
    pub indicator_hits: Vec<String>,
}

/// An accepted sample in its persisted form.
///
/// Field order is the wire order of the split files; consumers depend on
/// exactly these keys being present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleRecord {
    pub serial_no: u32,
    pub vulnerable_code: String,
    pub vulnerability_type: String,
    pub repo: String,
    pub commit: String,
    pub commit_msg: String,
    pub original_file: String,
    pub confidence_score: f64,
}

impl SampleRecord {
    /// Resolve the stored label against the closed category set
    pub fn category(&self) -> Option<Category> {
        Category::from_label(&self.vulnerability_type)
    }
}

/// Why a commit or candidate was filtered out.
///
/// Every rejection in this pipeline is a filtering decision, not an
/// exception; these reasons drive the per-stage audit counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoCategory,
    OversizedBlob,
    TrivialChange,
    NoIndicator,
    LowConfidence,
    DuplicateContent,
    DuplicateCommit,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NoCategory => "no_category",
            RejectReason::OversizedBlob => "oversized_blob",
            RejectReason::TrivialChange => "trivial_change",
            RejectReason::NoIndicator => "no_indicator",
            RejectReason::LowConfidence => "low_confidence",
            RejectReason::DuplicateContent => "duplicate_content",
            RejectReason::DuplicateCommit => "duplicate_commit",
        }
    }
}
