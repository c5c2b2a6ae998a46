//! Content and commit deduplication.
//!
//! The store is owned by the pipeline run and injected into the dedup stage,
//! never a module-level singleton, so repeated or parallel runs stay
//! composable and testable in isolation. First-seen wins: processing order
//! decides which of several near-duplicates is retained, which makes the
//! Commit Source's traversal order part of the pipeline's public contract.

use crate::types::RejectReason;
use crate::validate::normalize;
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};

/// Growing sets of seen content hashes and commit hashes for one run
#[derive(Debug, Default)]
pub struct DedupStore {
    content: FxHashSet<String>,
    commits: FxHashSet<String>,
}

/// SHA-256 over the normalized code, hex encoded.
///
/// Normalization strips comments and collapses whitespace first, so two
/// snippets differing only cosmetically share a key.
pub fn content_key(code: &str) -> String {
    hex::encode(Sha256::digest(normalize(code).as_bytes()))
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a candidate, recording both hashes, or reject it as a
    /// duplicate. Content duplicates are reported ahead of commit
    /// duplicates when both apply. Nothing is recorded on rejection.
    pub fn admit(&mut self, code: &str, commit: &str, by_commit: bool) -> Result<(), RejectReason> {
        let key = content_key(code);
        if self.content.contains(&key) {
            return Err(RejectReason::DuplicateContent);
        }
        if by_commit && self.commits.contains(commit) {
            return Err(RejectReason::DuplicateCommit);
        }

        self.content.insert(key);
        self.commits.insert(commit.to_string());
        Ok(())
    }

    pub fn seen_content(&self) -> usize {
        self.content.len()
    }

    pub fn seen_commits(&self) -> usize {
        self.commits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const COMMIT_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_first_seen_wins() {
        let mut store = DedupStore::new();
        assert!(store.admit("query(a);", COMMIT_A, true).is_ok());
        assert_eq!(
            store.admit("query(a);", COMMIT_B, true),
            Err(RejectReason::DuplicateContent)
        );
        assert_eq!(store.seen_content(), 1);
        assert_eq!(store.seen_commits(), 1);
    }

    #[test]
    fn test_cosmetic_variants_share_a_key() {
        assert_eq!(content_key("query(a);"), content_key("  query(a);  // note"));
        assert_ne!(content_key("query(a);"), content_key("query(b);"));
    }

    #[test]
    fn test_commit_coarsening() {
        let mut store = DedupStore::new();
        assert!(store.admit("query(a);", COMMIT_A, true).is_ok());
        assert_eq!(
            store.admit("query(b);", COMMIT_A, true),
            Err(RejectReason::DuplicateCommit)
        );
    }

    #[test]
    fn test_commit_coarsening_disabled() {
        let mut store = DedupStore::new();
        assert!(store.admit("query(a);", COMMIT_A, false).is_ok());
        assert!(store.admit("query(b);", COMMIT_A, false).is_ok());
        assert_eq!(store.seen_content(), 2);
    }

    #[test]
    fn test_rejection_records_nothing() {
        let mut store = DedupStore::new();
        assert!(store.admit("query(a);", COMMIT_A, true).is_ok());
        // Content dup from a fresh commit: the fresh commit must stay unseen
        assert!(store.admit("query(a);", COMMIT_B, true).is_err());
        assert!(store.admit("query(c);", COMMIT_B, true).is_ok());
    }
}
