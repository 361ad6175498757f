use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
/// Errors returned by catalog indexing.
pub enum IndexError {
    /// Another rebuild is already running.
    #[error("an index rebuild is already in progress")]
    InProgress,

    /// Catalog scan failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Embedding a document batch failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Vector store operation failed.
    #[error(transparent)]
    VectorDb(#[from] VectorDbError),
}
