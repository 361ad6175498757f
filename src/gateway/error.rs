use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::index::IndexError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Pipeline(PipelineError::RateLimited { .. }) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
            }
            ApiError::Pipeline(PipelineError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            ApiError::Pipeline(PipelineError::Retrieval(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "retrieval_unavailable")
            }
            ApiError::Pipeline(PipelineError::Ranking(_)) => {
                (StatusCode::BAD_GATEWAY, "ranking_failed")
            }
            ApiError::Index(IndexError::InProgress) => (StatusCode::CONFLICT, "reindex_in_progress"),
            ApiError::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "index_error"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
            kind,
        });

        (status, body).into_response()
    }
}
