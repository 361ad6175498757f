use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the relational product store.
pub enum StoreError {
    /// Could not connect to the database.
    #[error("failed to connect to MySQL: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// A query failed to execute or decode.
    #[error("product store query failed: {message}")]
    QueryFailed {
        /// Error message.
        message: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::QueryFailed {
            message: err.to_string(),
        }
    }
}
