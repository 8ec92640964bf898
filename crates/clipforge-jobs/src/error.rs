//! Error types for job tracking.

use clipforge_core::{AssetId, ErrorClass};
use thiserror::Error;

/// Errors that can occur while starting or tracking a job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    /// A job for this asset is already live.
    #[error("Optimization already in progress for {asset}")]
    AlreadyInProgress { asset: AssetId },

    /// The asset cannot be removed while it is being optimized.
    #[error("Asset {asset} is being optimized")]
    AssetBusy { asset: AssetId },

    /// The request to the job service failed.
    #[error("Job service request failed: {0}")]
    Transport(String),

    /// The job service answered with something we cannot read.
    #[error("Malformed job status: {0}")]
    Malformed(String),

    /// The job ran past the wall-clock ceiling.
    #[error("Job timed out after {elapsed_ms} ms")]
    TimedOut { elapsed_ms: u64 },

    /// The job was aborted before it could start polling.
    #[error("Job aborted")]
    Aborted,

    /// No job is known for this asset.
    #[error("No job for {asset}")]
    NotFound { asset: AssetId },
}

impl JobError {
    /// Taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AlreadyInProgress { .. } | Self::AssetBusy { .. } | Self::Aborted => {
                ErrorClass::ConcurrencyConflict
            }
            Self::Transport(_) | Self::Malformed(_) => ErrorClass::TransientNetwork,
            Self::TimedOut { .. } => ErrorClass::Timeout,
            Self::NotFound { .. } => ErrorClass::UserInput,
        }
    }
}

impl From<serde_json::Error> for JobError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Result type alias for job operations.
pub type Result<T> = std::result::Result<T, JobError>;
