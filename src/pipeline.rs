//! The extraction pipeline.
//!
//! Runs each materialized commit through
//! classify → validate → match → score, then deduplicates and freezes the
//! survivors into numbered sample records.
//!
//! The per-commit stages are pure, so they run on the rayon pool with an
//! order-preserving collect; deduplication then walks the results
//! sequentially in source order. First-seen-wins behavior is therefore
//! identical to a serial run, and a fixed traversal order yields a
//! byte-identical accepted set.

use crate::classify::MessageClassifier;
use crate::config::PipelineConfig;
use crate::dedup::DedupStore;
use crate::error::Result;
use crate::matcher::PatternMatcher;
use crate::report::{RunReport, StageCounters};
use crate::rules::RuleSet;
use crate::score::ConfidenceScorer;
use crate::source::CommitSource;
use crate::types::{CandidateSample, CommitRecord, RejectReason, SampleRecord, ScoreSignals};
use crate::validate::ChangeValidator;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// The configured pipeline. Holds no per-run state; the dedup store is
/// created per run.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    rules: RuleSet,
    scorer: ConfidenceScorer,
}

/// Result of one pipeline run: the accepted samples in acceptance order
/// plus the audit report
#[derive(Debug)]
pub struct RunOutput {
    pub samples: Vec<SampleRecord>,
    pub report: RunReport,
}

/// Builder for configuring and creating Pipeline instances
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    rules: Option<RuleSet>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom configuration (validates the config)
    pub fn config(mut self, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    #[must_use]
    pub fn min_change_delta(mut self, delta: usize) -> Self {
        self.config.min_change_delta = delta;
        self
    }

    #[must_use]
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    #[must_use]
    pub fn dedup_by_commit(mut self, dedup: bool) -> Self {
        self.config.dedup_by_commit = dedup;
        self
    }

    /// Use a custom rule table instead of the built-in one
    #[must_use]
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        Ok(Pipeline {
            config: self.config,
            rules: self.rules.unwrap_or_default(),
            scorer: ConfidenceScorer::new(),
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            rules: RuleSet::builtin(),
            scorer: ConfidenceScorer::new(),
        }
    }
}

impl Pipeline {
    /// Create a pipeline builder for fluent configuration
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Create a pipeline with published defaults and the built-in rule table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pipeline's configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The rule table in use, shared with downstream augmentation and
    /// verification
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run the full pipeline over a commit source
    pub fn run(&self, source: &dyn CommitSource) -> Result<RunOutput> {
        let batch = source.commits()?;
        info!(
            "materialized {} commits ({} malformed) from {}",
            batch.commits.len(),
            batch.malformed,
            source.describe()
        );

        let mut counters = StageCounters {
            commits_seen: batch.commits.len(),
            malformed_records: batch.malformed,
            ..StageCounters::default()
        };

        let classifier = MessageClassifier::new(&self.rules);
        let matcher = PatternMatcher::new(&self.rules);
        let validator = ChangeValidator::new(self.config.min_change_delta);

        // Pure per-commit work, order-preserving
        let staged: Vec<(Vec<CandidateSample>, StageCounters)> = batch
            .commits
            .par_iter()
            .map(|commit| self.process_commit(commit, &classifier, &matcher, &validator))
            .collect();

        // Dedup is the only cross-record state; run it serially in source order
        let mut store = DedupStore::new();
        let mut samples = Vec::new();
        for (candidates, tally) in staged {
            counters.merge(&tally);
            for candidate in candidates {
                match store.admit(&candidate.code, &candidate.commit, self.config.dedup_by_commit)
                {
                    Ok(()) => {
                        counters.accepted += 1;
                        let serial_no = samples.len() as u32 + 1;
                        samples.push(freeze(serial_no, candidate));
                    }
                    Err(reason) => {
                        debug!(
                            "rejected {} from {} ({})",
                            candidate.file_name,
                            candidate.commit,
                            reason.as_str()
                        );
                        counters.record_rejection(reason);
                    }
                }
            }
        }

        info!(
            "pipeline run complete: {} accepted of {} diffs ({:.1}%)",
            counters.accepted,
            counters.diffs_considered,
            counters.acceptance_rate() * 100.0
        );

        let report = RunReport::new(counters, &samples);
        Ok(RunOutput { samples, report })
    }

    fn process_commit(
        &self,
        commit: &CommitRecord,
        classifier: &MessageClassifier<'_>,
        matcher: &PatternMatcher<'_>,
        validator: &ChangeValidator,
    ) -> (Vec<CandidateSample>, StageCounters) {
        let mut tally = StageCounters::default();

        let Some(category) = classifier.classify(&commit.message) else {
            tally.record_rejection(RejectReason::NoCategory);
            return (Vec::new(), tally);
        };

        let strong_message = self.scorer.strong_message(&commit.message);
        let mut candidates = Vec::new();

        for diff in &commit.files {
            tally.diffs_considered += 1;

            if diff.before.len() > self.config.max_blob_bytes
                || diff.after.len() > self.config.max_blob_bytes
            {
                debug!("skipping oversized blob {} in {}", diff.path, commit.hash);
                tally.record_rejection(RejectReason::OversizedBlob);
                continue;
            }

            if let Some(reason) = validator.check(&diff.before, &diff.after) {
                tally.record_rejection(reason);
                continue;
            }

            let indicator_hits = matcher.vulnerability_hits(category, &diff.before);
            if indicator_hits.is_empty() {
                tally.record_rejection(RejectReason::NoIndicator);
                continue;
            }

            let signals = ScoreSignals {
                real_change: true,
                vuln_pattern: true,
                fix_pattern: matcher.has_fix_indicator(category, &diff.after),
                strong_message,
            };
            let score = self.scorer.score(signals);
            if score < self.config.confidence_threshold {
                tally.record_rejection(RejectReason::LowConfidence);
                continue;
            }

            candidates.push(CandidateSample {
                category,
                code: diff.before.clone(),
                repo: commit.repo.clone(),
                commit: commit.hash.clone(),
                message: commit.message.clone(),
                file_name: file_name_only(&diff.path),
                signals,
                score,
                indicator_hits,
            });
        }

        (candidates, tally)
    }
}

/// Freeze an accepted candidate into its persisted form
fn freeze(serial_no: u32, candidate: CandidateSample) -> SampleRecord {
    SampleRecord {
        serial_no,
        vulnerable_code: candidate.code,
        vulnerability_type: candidate.category.label().to_string(),
        repo: candidate.repo,
        commit: candidate.commit,
        commit_msg: candidate.message,
        original_file: candidate.file_name,
        confidence_score: candidate.score,
    }
}

/// Filename only, path components stripped
fn file_name_only(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
