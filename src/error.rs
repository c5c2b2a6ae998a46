use std::path::PathBuf;
use thiserror::Error;

/// Quarry's custom error types for better error handling and user experience.
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule table loading failed: {message}")]
    RuleLoading { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Malformed commit record at {context}: {message}")]
    MalformedRecord { context: String, message: String },

    #[error("Commit source unreadable: {path}")]
    SourceUnreadable { path: PathBuf },

    #[error("Dataset file missing or unreadable: {path}")]
    DatasetUnreadable { path: PathBuf },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },
}

pub type Result<T> = std::result::Result<T, QuarryError>;

impl QuarryError {
    pub fn rule_loading<S: Into<String>>(message: S) -> Self {
        Self::RuleLoading { message: message.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn malformed_record<S1: Into<String>, S2: Into<String>>(context: S1, message: S2) -> Self {
        Self::MalformedRecord { context: context.into(), message: message.into() }
    }

    pub fn source_unreadable<P: Into<PathBuf>>(path: P) -> Self {
        Self::SourceUnreadable { path: path.into() }
    }

    pub fn dataset_unreadable<P: Into<PathBuf>>(path: P) -> Self {
        Self::DatasetUnreadable { path: path.into() }
    }

    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into() }
    }

    /// Returns true if the error affects a single record and processing can continue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
