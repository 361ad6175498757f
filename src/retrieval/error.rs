use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
/// Errors returned by candidate retrieval.
pub enum RetrievalError {
    /// No index generation has been activated yet.
    #[error("no active index generation, run a rebuild first")]
    NoActiveGeneration,

    /// Query embedding failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Vector search failed.
    #[error(transparent)]
    VectorDb(#[from] VectorDbError),

    /// A collaborator call exceeded its deadline.
    #[error("retrieval timed out after {seconds}s")]
    Timeout {
        /// Configured deadline in seconds.
        seconds: u64,
    },
}
