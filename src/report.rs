//! Run reporting and dataset statistics.
//!
//! Every rejection is a filtering decision, and the published acceptance
//! rates are the dataset's primary quality claim, so each stage's drops are
//! counted and surfaced. Statistics are always derived from the accepted
//! set itself, never hand-authored, so they cannot drift from the split
//! files.

use crate::split::SplitDataset;
use crate::types::{RejectReason, SampleRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-stage audit counters for one pipeline run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StageCounters {
    /// Commits materialized from the source
    pub commits_seen: usize,
    /// Records the source could not decode (skip-and-log)
    pub malformed_records: usize,
    /// Commits whose message matched no category
    pub unclassified_commits: usize,
    /// File diffs examined in classified commits
    pub diffs_considered: usize,
    pub oversized_blobs: usize,
    pub trivial_changes: usize,
    /// Candidates whose before text matched no vulnerability indicator
    pub missing_indicator: usize,
    pub low_confidence: usize,
    pub duplicate_content: usize,
    pub duplicate_commit: usize,
    pub accepted: usize,
}

impl StageCounters {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::NoCategory => self.unclassified_commits += 1,
            RejectReason::OversizedBlob => self.oversized_blobs += 1,
            RejectReason::TrivialChange => self.trivial_changes += 1,
            RejectReason::NoIndicator => self.missing_indicator += 1,
            RejectReason::LowConfidence => self.low_confidence += 1,
            RejectReason::DuplicateContent => self.duplicate_content += 1,
            RejectReason::DuplicateCommit => self.duplicate_commit += 1,
        }
    }

    pub fn merge(&mut self, other: &StageCounters) {
        self.commits_seen += other.commits_seen;
        self.malformed_records += other.malformed_records;
        self.unclassified_commits += other.unclassified_commits;
        self.diffs_considered += other.diffs_considered;
        self.oversized_blobs += other.oversized_blobs;
        self.trivial_changes += other.trivial_changes;
        self.missing_indicator += other.missing_indicator;
        self.low_confidence += other.low_confidence;
        self.duplicate_content += other.duplicate_content;
        self.duplicate_commit += other.duplicate_commit;
        self.accepted += other.accepted;
    }

    /// Accepted samples over examined file diffs
    pub fn acceptance_rate(&self) -> f64 {
        if self.diffs_considered == 0 {
            0.0
        } else {
            self.accepted as f64 / self.diffs_considered as f64
        }
    }
}

/// Summary of one extraction run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub counters: StageCounters,
    /// Accepted sample counts per category label
    pub per_category: BTreeMap<String, usize>,
    /// Accepted sample counts per confidence score
    pub confidence_histogram: BTreeMap<String, usize>,
}

impl RunReport {
    pub fn new(counters: StageCounters, samples: &[SampleRecord]) -> Self {
        Self {
            counters,
            per_category: count_by_category(samples),
            confidence_histogram: confidence_histogram(samples),
        }
    }
}

/// The `dataset_statistics.json` payload, mirroring the split files
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatistics {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub total_samples: usize,
    pub per_category: BTreeMap<String, usize>,
    pub per_split: BTreeMap<String, usize>,
    /// Category counts inside each split, for checking stratification
    pub per_split_category: BTreeMap<String, BTreeMap<String, usize>>,
    pub confidence_histogram: BTreeMap<String, usize>,
    /// Present when the statistics come from a fresh extraction run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<StageCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_rate: Option<f64>,
}

impl DatasetStatistics {
    pub fn from_split(split: &SplitDataset, extraction: Option<StageCounters>) -> Self {
        let all: Vec<SampleRecord> = split
            .named()
            .iter()
            .flat_map(|(_, part)| part.iter().cloned())
            .collect();

        let mut per_split = BTreeMap::new();
        let mut per_split_category = BTreeMap::new();
        for (name, part) in split.named() {
            per_split.insert(name.to_string(), part.len());
            per_split_category.insert(name.to_string(), count_by_category(part));
        }

        let acceptance_rate = extraction.as_ref().map(StageCounters::acceptance_rate);
        Self {
            schema_version: "1.0".to_string(),
            generated_at: Utc::now(),
            total_samples: all.len(),
            per_category: count_by_category(&all),
            per_split,
            per_split_category,
            confidence_histogram: confidence_histogram(&all),
            extraction,
            acceptance_rate,
        }
    }
}

fn count_by_category(samples: &[SampleRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for sample in samples {
        *counts.entry(sample.vulnerability_type.clone()).or_insert(0) += 1;
    }
    counts
}

fn confidence_histogram(samples: &[SampleRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for sample in samples {
        *counts.entry(format!("{:.1}", sample.confidence_score)).or_insert(0) += 1;
    }
    counts
}
