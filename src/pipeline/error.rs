use thiserror::Error;

use crate::ranking::RankingError;
use crate::retrieval::RetrievalError;

#[derive(Debug, Error)]
/// Errors returned by the substitution pipeline.
pub enum PipelineError {
    /// The client identity has exhausted its request allowance.
    #[error("request limit of {limit} reached for this client")]
    RateLimited {
        /// Configured ceiling.
        limit: u32,
    },

    /// The request failed validation.
    #[error("invalid request: {message}")]
    Validation {
        /// What was wrong.
        message: String,
    },

    /// Candidate retrieval failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Ranking failed.
    #[error(transparent)]
    Ranking(#[from] RankingError),
}
