//! Stratified train/val/test splitting.
//!
//! Partitions the accepted set so that each category's samples follow the
//! global split proportions. Rounding rule: per category, every split gets
//! the floor of its quota, and the leftover samples go to the splits with
//! the largest fractional remainders, ties resolved val, then test, then
//! train. Within a category, assignment follows acceptance order: the train
//! block first, then val, then test.

use crate::config::SplitRatios;
use crate::types::{Category, SampleRecord};
use tracing::debug;

/// The three disjoint partitions of an accepted sample set
#[derive(Debug, Clone, Default)]
pub struct SplitDataset {
    pub train: Vec<SampleRecord>,
    pub val: Vec<SampleRecord>,
    pub test: Vec<SampleRecord>,
}

impl SplitDataset {
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    /// The splits with their file-stem names, in fixed order
    pub fn named(&self) -> [(&'static str, &[SampleRecord]); 3] {
        [("train", &self.train), ("val", &self.val), ("test", &self.test)]
    }
}

/// Per-category sample counts for the three splits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

/// Largest-remainder apportionment of `n` samples across the three splits
pub fn apportion(n: usize, ratios: SplitRatios) -> SplitCounts {
    let quotas = [
        (n as f64) * ratios.train,
        (n as f64) * ratios.val,
        (n as f64) * ratios.test,
    ];
    let mut counts = [quotas[0] as usize, quotas[1] as usize, quotas[2] as usize];
    let assigned: usize = counts.iter().sum();

    // Hand out the leftovers by largest fractional remainder.
    // Tie order: val (1), test (2), train (0).
    let tie_rank = [2usize, 0, 1];
    let mut order: Vec<usize> = vec![0, 1, 2];
    order.sort_by(|&a, &b| {
        let frac_a = quotas[a] - quotas[a].floor();
        let frac_b = quotas[b] - quotas[b].floor();
        frac_b
            .partial_cmp(&frac_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(tie_rank[a].cmp(&tie_rank[b]))
    });
    for i in 0..(n - assigned) {
        counts[order[i % 3]] += 1;
    }

    SplitCounts { train: counts[0], val: counts[1], test: counts[2] }
}

/// Stratified split of the accepted set.
///
/// Samples within each split come out ordered by serial number, so the
/// result is deterministic for a fixed input order.
pub fn stratified_split(samples: &[SampleRecord], ratios: SplitRatios) -> SplitDataset {
    let mut split = SplitDataset::default();

    for category in Category::ALL {
        let of_category: Vec<&SampleRecord> = samples
            .iter()
            .filter(|s| s.vulnerability_type == category.label())
            .collect();
        let counts = apportion(of_category.len(), ratios);
        debug!(
            category = category.key(),
            total = of_category.len(),
            train = counts.train,
            val = counts.val,
            test = counts.test,
            "stratified category"
        );

        for (index, sample) in of_category.into_iter().enumerate() {
            if index < counts.train {
                split.train.push(sample.clone());
            } else if index < counts.train + counts.val {
                split.val.push(sample.clone());
            } else {
                split.test.push(sample.clone());
            }
        }
    }

    split.train.sort_by_key(|s| s.serial_no);
    split.val.sort_by_key(|s| s.serial_no);
    split.test.sort_by_key(|s| s.serial_no);
    split
}
