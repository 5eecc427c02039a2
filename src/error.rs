//! Error types for trajectory loading and analysis.
//!
//! Whole-file failures ([`TrackError::MalformedHeader`], [`TrackError::EmptyTrajectory`]
//! and I/O failures) are wrapped into [`TrackError::Load`] when a session is loaded
//! from disk, so the caller sees a single load failure per file. Per-line parse
//! failures never leave the loader.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for trajectory operations.
#[derive(Error, Debug)]
pub enum TrackError {
    /// A required session constant is missing from the header or has an invalid value.
    #[error("Malformed header: {field}")]
    MalformedHeader { field: String },

    /// No analyzable record remained after the start correction.
    #[error("Empty trajectory: no valid records after start correction")]
    EmptyTrajectory,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Loading a file (or pair of files) failed.
    #[error("Failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<TrackError>,
    },

    /// The paired file name could not be derived from the primary file name.
    #[error("Cannot derive paired file name for {}", .path.display())]
    UnpairedFile { path: PathBuf },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input validation errors.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for trajectory operations.
pub type Result<T> = std::result::Result<T, TrackError>;

impl TrackError {
    /// Create a malformed header error.
    #[must_use]
    pub fn malformed_header(field: impl Into<String>) -> Self {
        Self::MalformedHeader {
            field: field.into(),
        }
    }

    /// Wrap an error as the load failure of `path`.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>, source: Self) -> Self {
        Self::Load {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns `true` if this error (or the error it wraps) is a missing-data condition.
    #[must_use]
    pub fn is_empty_trajectory(&self) -> bool {
        match self {
            Self::EmptyTrajectory => true,
            Self::Load { source, .. } => source.is_empty_trajectory(),
            _ => false,
        }
    }
}

/// A body line that could not be parsed into a record.
///
/// Recovered locally by the loader: the line is skipped and does not advance
/// the frame counter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineParseError {
    /// Fewer numeric fields than a record needs.
    #[error("expected at least {expected} fields, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    /// A field is not a number.
    #[error("field {index} is not numeric: {text:?}")]
    NotNumeric { index: usize, text: String },

    /// The frame field is negative or fractional.
    #[error("invalid frame number {0}")]
    InvalidFrame(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackError::malformed_header("TrackerResolution_PixPerCM");
        assert!(err.to_string().contains("TrackerResolution_PixPerCM"));

        let err = TrackError::load("session.dat", TrackError::EmptyTrajectory);
        let text = err.to_string();
        assert!(text.contains("session.dat"));
        assert!(text.contains("Empty trajectory"));
    }

    #[test]
    fn test_load_wrapping_keeps_source() {
        let err = TrackError::load("a.dat", TrackError::EmptyTrajectory);
        assert!(err.is_empty_trajectory());
        assert!(std::error::Error::source(&err).is_some());

        let err = TrackError::load("a.dat", TrackError::malformed_header("ArenaDiameter"));
        assert!(!err.is_empty_trajectory());
    }

    #[test]
    fn test_line_parse_error_display() {
        let err = LineParseError::TooFewFields {
            expected: 6,
            actual: 2,
        };
        assert_eq!(err.to_string(), "expected at least 6 fields, got 2");
    }
}
