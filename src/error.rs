//! Error types for the prompt library
//!
//! Every failure the store can report falls into one of three kinds (see
//! [`ErrorKind`]). The consuming layer decides whether to report and continue
//! or to abort; nothing in the library exits the process.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Coarse classification of a [`LibraryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced record or backing file is absent
    NotFound,
    /// A required field is missing or blank
    InvalidInput,
    /// The document cannot be parsed, validated or written
    Serialization,
}

/// Main error type for the prompt library
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Backing library file does not exist
    #[error("Library file not found: {}", path.display())]
    LibraryNotFound { path: PathBuf },

    /// No record carries the requested id
    #[error("Prompt not found: {0}")]
    RecordNotFound(String),

    /// Required field missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A record in the document failed schema validation
    #[error("Invalid record at index {index}: {reason}")]
    Validation { index: usize, reason: String },

    /// Document is not well-formed JSON or has an unsupported shape
    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV report could not be produced
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while touching a file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LibraryError::Io {
            path: path.into(),
            source,
        }
    }

    /// Which of the three error kinds this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::LibraryNotFound { .. } | LibraryError::RecordNotFound(_) => {
                ErrorKind::NotFound
            }
            LibraryError::InvalidInput(_) => ErrorKind::InvalidInput,
            LibraryError::Validation { .. }
            | LibraryError::Parse { .. }
            | LibraryError::Json(_)
            | LibraryError::Csv(_)
            | LibraryError::Io { .. } => ErrorKind::Serialization,
        }
    }

    /// Short category name used in log fields
    pub fn category(&self) -> &'static str {
        match self {
            LibraryError::LibraryNotFound { .. } => "library_missing",
            LibraryError::RecordNotFound(_) => "record_missing",
            LibraryError::InvalidInput(_) => "input",
            LibraryError::Validation { .. } => "validation",
            LibraryError::Parse { .. } => "parse",
            LibraryError::Json(_) => "serialization",
            LibraryError::Csv(_) => "csv",
            LibraryError::Io { .. } => "io",
        }
    }
}
