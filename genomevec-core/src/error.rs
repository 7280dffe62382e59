//! # Error Handling
//!
//! Error types shared by every genomevec crate.
//!
//! Format and dimension errors abort the current operation. Annotation lookup
//! misses are not errors at all; they resolve to the `NA` sentinel further up.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for genomevec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Primary error type for genomevec
#[derive(Error, Debug)]
pub enum Error {
    // Input Errors
    #[error("Input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Format error in {source_name} at line {line}: {message}")]
    Format {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("No data rows in {source_name}")]
    EmptyInput { source_name: String },

    #[error("Annotation parse error at line {line}: {message}")]
    AnnotationParse { line: usize, message: String },

    // Query Errors
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Position {position} is out of range (valid: 1..={len})")]
    PositionOutOfRange { position: i64, len: usize },

    // Index Errors
    #[error("Insufficient data: {required} vectors required for training, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("Clustered index must be trained before vectors are added")]
    NotTrained,

    #[error("Index corruption detected: {details}")]
    IndexCorruption { details: String },

    // System Errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        source: std::io::Error,
    },
}

impl Error {
    /// Map an IO error for a known path, turning `NotFound` into `InputNotFound`.
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io {
                message: format!("{}: {}", path.display(), err),
                source: err,
            }
        }
    }

    /// Shorthand for a `Format` error
    pub fn format(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's request rather than by
    /// malformed data or the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InputNotFound { .. }
                | Error::DimensionMismatch { .. }
                | Error::PositionOutOfRange { .. }
                | Error::InsufficientData { .. }
                | Error::Configuration { .. }
        )
    }

    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InputNotFound { .. } => "INPUT_NOT_FOUND",
            Error::Format { .. } => "FORMAT_ERROR",
            Error::EmptyInput { .. } => "EMPTY_INPUT",
            Error::AnnotationParse { .. } => "ANNOTATION_PARSE_ERROR",
            Error::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Error::PositionOutOfRange { .. } => "POSITION_OUT_OF_RANGE",
            Error::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Error::NotTrained => "NOT_TRAINED",
            Error::IndexCorruption { .. } => "INDEX_CORRUPTION",
            Error::Configuration { .. } => "CONFIG_ERROR",
            Error::Io { .. } => "IO_ERROR",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
