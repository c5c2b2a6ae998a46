use crate::error::{QuarryError, Result};

/// Fixed parameters of the published extraction pipeline
pub const DEFAULT_MIN_CHANGE_DELTA: usize = 50;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_MAX_BLOB_BYTES: usize = 512 * 1024; // 512KB per before/after blob

/// Train/validation/test proportions for the stratified splitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.70, val: 0.15, test: 0.15 }
    }
}

impl SplitRatios {
    /// Create new ratios with validation
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        let ratios = Self { train, val, test };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Check that ratios are non-negative and sum to 1
    pub fn validate(&self) -> Result<()> {
        if self.train < 0.0 || self.val < 0.0 || self.test < 0.0 {
            return Err(QuarryError::configuration("split ratios must be non-negative"));
        }
        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(QuarryError::configuration(format!(
                "split ratios must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Configuration for a pipeline run with validation and published defaults
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum absolute length delta between normalized before/after texts
    pub min_change_delta: usize,
    /// Samples scoring below this are rejected, never flagged
    pub confidence_threshold: f64,
    /// Stratified split proportions
    pub split_ratios: SplitRatios,
    /// Retain at most one sample per commit hash (reference-design coarsening)
    pub dedup_by_commit: bool,
    /// Skip-and-log blobs larger than this
    pub max_blob_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_change_delta: DEFAULT_MIN_CHANGE_DELTA,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            split_ratios: SplitRatios::default(),
            dedup_by_commit: true,
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return errors for invalid settings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(QuarryError::configuration(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.max_blob_bytes == 0 {
            return Err(QuarryError::configuration("max_blob_bytes must be greater than 0"));
        }
        self.split_ratios.validate()?;
        Ok(())
    }

    /// Stricter preset: larger change delta and a higher acceptance bar,
    /// trading yield for precision
    #[must_use]
    pub fn strict() -> Self {
        Self {
            min_change_delta: 100,
            confidence_threshold: 0.8,
            ..Self::default()
        }
    }
}
