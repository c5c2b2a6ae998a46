//! quarry - mines vulnerability-fixing commits into a labeled Java snippet
//! dataset.
//!
//! This library reconstructs a 6-layer validation and confidence-scoring
//! pipeline over materialized commit records: keyword classification into a
//! closed category set, substantive-change validation, indicator pattern
//! matching, quantized confidence scoring, content/commit deduplication and
//! stratified train/val/test splitting, with optional label-preserving
//! augmentation downstream.
//!
//! # Example
//!
//! ```no_run
//! use quarry::{JsonlCommitSource, Pipeline};
//!
//! let pipeline = Pipeline::new();
//! let source = JsonlCommitSource::new("commits.jsonl");
//! let output = pipeline.run(&source).unwrap();
//!
//! for sample in &output.samples {
//!     println!("{} {} ({})", sample.serial_no, sample.vulnerability_type, sample.commit);
//! }
//! ```

pub mod augment;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod score;
pub mod source;
pub mod split;
pub mod types;
pub mod validate;
pub mod verify;

// Re-export commonly used types at crate root
pub use augment::Augmenter;
pub use config::{PipelineConfig, SplitRatios};
pub use error::{QuarryError, Result};
pub use pipeline::{Pipeline, PipelineBuilder, RunOutput};
pub use report::{DatasetStatistics, RunReport, StageCounters};
pub use rules::RuleSet;
pub use source::{CommitSource, JsonlCommitSource, MemorySource, SourceBatch};
pub use split::{stratified_split, SplitDataset};
pub use types::{Category, CommitRecord, FileDiff, SampleRecord};
pub use verify::{verify_dataset, VerifyOptions, Violation};

/// Run the pipeline over a JSON-lines commit dump with default settings.
///
/// This is the main entry point for extracting programmatically; use
/// [`Pipeline::builder`] for custom thresholds or rule tables.
pub fn extract_from_jsonl<P: AsRef<std::path::Path>>(path: P) -> Result<RunOutput> {
    let pipeline = Pipeline::new();
    let source = JsonlCommitSource::new(path.as_ref());
    pipeline.run(&source)
}
