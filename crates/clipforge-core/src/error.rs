//! Error types for ClipForge.

use thiserror::Error;

/// Coarse classification shared by every ClipForge error type.
///
/// The UI decides how to present a failure (inline hint, dismissible
/// notice, terminal banner) from the class alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Invalid trim bounds or missing selection. Reported inline, never fatal.
    UserInput,
    /// Decode, network or unsupported-source failure from the playback surface.
    PlaybackSurface,
    /// A request failed in transit and may be retried locally.
    TransientNetwork,
    /// A tracked job exceeded its wall-clock ceiling.
    Timeout,
    /// The request conflicts with work already in progress.
    ConcurrencyConflict,
    /// Settings could not be read, parsed or validated. Fatal at startup.
    Configuration,
}

impl ErrorClass {
    /// Whether the caller can reasonably retry the same operation.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::UserInput | Self::PlaybackSurface | Self::TransientNetwork
        )
    }
}

/// Main error type for clip authoring and core operations.
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("No asset selected")]
    NoAssetSelected,

    #[error("Clip start {start:.3}s must be before end {end:.3}s")]
    InvalidOrder { start: f64, end: f64 },

    #[error("Clip is {length:.3}s long, minimum is {minimum:.3}s")]
    TooShort { length: f64, minimum: f64 },

    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipError {
    /// Taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoAssetSelected
            | Self::InvalidOrder { .. }
            | Self::TooShort { .. }
            | Self::InvalidTimecode(_) => ErrorClass::UserInput,
            Self::Config(_) | Self::Serialization(_) | Self::Io(_) => ErrorClass::Configuration,
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, ClipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_user_input() {
        assert_eq!(ClipError::NoAssetSelected.class(), ErrorClass::UserInput);
        let err = ClipError::TooShort {
            length: 0.05,
            minimum: 0.1,
        };
        assert_eq!(err.class(), ErrorClass::UserInput);
        assert_eq!(err.to_string(), "Clip is 0.050s long, minimum is 0.100s");
    }

    #[test]
    fn test_retryable_classes() {
        assert!(ErrorClass::TransientNetwork.is_retryable());
        assert!(!ErrorClass::Timeout.is_retryable());
        assert!(!ErrorClass::ConcurrencyConflict.is_retryable());
        assert!(!ErrorClass::Configuration.is_retryable());
    }

    #[test]
    fn test_settings_failures_are_not_user_input() {
        let io = ClipError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.class(), ErrorClass::Configuration);
        assert_eq!(ClipError::Config("bad".into()).class(), ErrorClass::Configuration);
        assert_eq!(
            ClipError::Serialization("bad".into()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            ClipError::InvalidTimecode("x".into()).class(),
            ErrorClass::UserInput
        );
    }
}
