//! Error types for the asset library.

use clipforge_core::{AssetId, ErrorClass};
use thiserror::Error;

/// Errors that can occur while loading thumbnails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
    /// The acquisition service failed to produce a thumbnail.
    #[error("Thumbnail acquisition failed for {locator}: {reason}")]
    Acquisition { locator: String, reason: String },

    /// The asset has no registered card.
    #[error("Unknown asset: {0}")]
    UnknownAsset(AssetId),
}

impl LoaderError {
    /// Taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Acquisition { .. } => ErrorClass::TransientNetwork,
            Self::UnknownAsset(_) => ErrorClass::UserInput,
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, LoaderError>;
