//! Ingestion error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a file into markdown.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    #[error("no text extracted from {0}")]
    Empty(PathBuf),
}

/// Error from the blob store, index or pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("blob {blob} is leased")]
    LeaseConflict { blob: String },
    #[error("lease mismatch for {blob}")]
    LeaseMismatch { blob: String },
    #[error("convert: {0}")]
    Convert(#[from] ConvertError),
    #[error("embedding: {0}")]
    Embedding(String),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("task: {0}")]
    Task(String),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }
}
