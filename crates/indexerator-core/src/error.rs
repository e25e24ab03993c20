//! Error types for indexing runs

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the file indexing harness
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to transform {source_name} line {line}: {message}")]
    Transform {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IndexingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexingError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        IndexingError::Configuration {
            message: message.into(),
        }
    }
}

/// Result type alias for indexing operations
pub type IndexingResult<T> = Result<T, IndexingError>;
