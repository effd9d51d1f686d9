use thiserror::Error;

use crate::storage::StorageError;

/// Errors from the embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// An HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The request timed out.
    #[error("embedding request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("API error: {0}")]
    ApiError(String),

    /// The response body could not be decoded.
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Errors from the vector index and the indexing pipeline.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("blob fetch failed: {0}")]
    Storage(#[from] StorageError),

    /// The blob exists but cannot be indexed (e.g. not valid UTF-8).
    #[error("invalid document {0}: {1}")]
    InvalidDocument(String, String),
}
