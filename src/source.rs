//! Commit sources.
//!
//! The mining step that reads version history lives outside this crate; the
//! pipeline only consumes its materialized output through the
//! [`CommitSource`] trait. Sources materialize in bulk, up front: once
//! `commits()` returns, no stage blocks on external I/O and the traversal
//! order is fixed for the whole run.

use crate::error::{QuarryError, Result};
use crate::types::CommitRecord;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Bulk-materialized commits plus the count of records that could not be
/// decoded (skip-and-log, per-record)
#[derive(Debug)]
pub struct SourceBatch {
    pub commits: Vec<CommitRecord>,
    pub malformed: usize,
}

/// A store of materialized commit records with a stable iteration order
pub trait CommitSource {
    /// Materialize every commit, in the source's documented order.
    ///
    /// Failing to read the source at all is the only process-fatal
    /// condition; individually undecodable records are skipped and counted.
    fn commits(&self) -> Result<SourceBatch>;

    /// Human-readable description for logs and reports
    fn describe(&self) -> String;
}

/// Reads commit records from a JSON-lines dump, one record per line.
///
/// Line order is the traversal order, so the dump's producer controls which
/// of several duplicate candidates the deduplicator retains.
#[derive(Debug)]
pub struct JsonlCommitSource {
    path: PathBuf,
}

impl JsonlCommitSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_line(line: &str, line_no: usize) -> Result<CommitRecord> {
        let record: CommitRecord = serde_json::from_str(line).map_err(|e| {
            QuarryError::malformed_record(format!("line {line_no}"), e.to_string())
        })?;
        if !record.has_valid_hash() {
            return Err(QuarryError::malformed_record(
                format!("line {line_no}"),
                format!("'{}' is not a 40-character hex commit hash", record.hash),
            ));
        }
        Ok(record)
    }
}

impl CommitSource for JsonlCommitSource {
    fn commits(&self) -> Result<SourceBatch> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            warn!("cannot read commit source {}: {e}", self.path.display());
            QuarryError::source_unreadable(&self.path)
        })?;

        let mut commits = Vec::new();
        let mut malformed = 0;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Self::parse_line(line, index + 1) {
                Ok(record) => commits.push(record),
                // Graceful degradation: one bad record never aborts the run
                Err(e) if e.is_recoverable() => {
                    warn!("skipping record: {e}");
                    malformed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            "materialized {} commits ({} malformed) from {}",
            commits.len(),
            malformed,
            self.path.display()
        );
        Ok(SourceBatch { commits, malformed })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory source for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySource {
    commits: Vec<CommitRecord>,
}

impl MemorySource {
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self { commits }
    }
}

impl CommitSource for MemorySource {
    fn commits(&self) -> Result<SourceBatch> {
        Ok(SourceBatch { commits: self.commits.clone(), malformed: 0 })
    }

    fn describe(&self) -> String {
        format!("memory ({} commits)", self.commits.len())
    }
}
