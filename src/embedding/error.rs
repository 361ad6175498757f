use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the embedding collaborator.
pub enum EmbeddingError {
    /// The embeddings endpoint was unreachable or returned a non-success status.
    #[error("embedding request to '{url}' failed: {message}")]
    RequestFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The endpoint responded with a body that does not match the expected shape.
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    /// A returned vector did not have the configured dimension.
    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },
}
