//! Error types for pipeline operations.

use std::path::PathBuf;

use polars::prelude::PolarsError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type for pipeline operations.
///
/// Every variant is fatal for the run: the pipeline has no retry or
/// partial-failure handling.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Malformed source {source_name}: {message}")]
    Format {
        source_name: String,
        message: String,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Duplicate key '{key}' in {table}")]
    DuplicateKey { table: String, key: String },

    #[error("Null key in {table}")]
    NullKey { table: String },

    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(source_name: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Format {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}
