use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by candidate ranking.
pub enum RankingError {
    /// The model call failed.
    #[error("ranking model call failed: {message}")]
    ModelCall {
        /// Error message.
        message: String,
    },

    /// The model returned text that does not parse as the expected schema.
    #[error("ranking response did not match schema: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// The model call exceeded its deadline.
    #[error("ranking timed out after {seconds}s")]
    Timeout {
        /// Configured deadline in seconds.
        seconds: u64,
    },
}
