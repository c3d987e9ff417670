//! Error types for the data crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading, writing or validating experiment data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file did not contain a well-formed record.
    #[error("Malformed JSON in {}: {source}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// In-memory (de)serialisation failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Problem parameters are inconsistent.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// An experiment record is inconsistent with its parameters.
    #[error("Invalid experiment '{name}': {reason}")]
    InvalidExperiment {
        /// Experiment name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The data root does not exist or is not a directory.
    #[error("Data directory not found: {}", .0.display())]
    MissingDataDirectory(PathBuf),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for data operations.
pub type DataResult<T> = Result<T, DataError>;
