//! Playback surface errors.

use clipforge_core::ErrorClass;
use thiserror::Error;

/// Failures reported by (or about) the playback surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Media load aborted: {0}")]
    Aborted(String),

    #[error("Network error while loading media: {0}")]
    Network(String),

    #[error("Media decode failed: {0}")]
    Decode(String),

    #[error("Media source not supported: {0}")]
    Unsupported(String),

    #[error("Playback start rejected: {0}")]
    PlayRejected(String),

    #[error("Invalid playback rate: {0}")]
    InvalidRate(f64),
}

impl SurfaceError {
    /// Map a media-element error code (1 aborted, 2 network, 3 decode,
    /// 4 unsupported source) to a typed error.
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            1 => Self::Aborted(message),
            2 => Self::Network(message),
            3 => Self::Decode(message),
            _ => Self::Unsupported(message),
        }
    }

    /// Taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidRate(_) => ErrorClass::UserInput,
            _ => ErrorClass::PlaybackSurface,
        }
    }
}

/// Result type alias for playback operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;
