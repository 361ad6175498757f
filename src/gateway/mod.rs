//! HTTP surface.

pub mod error;
pub mod handler;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/substitute", post(handler::substitute_handler))
        .route("/categories", get(handler::categories_handler))
        .route("/index", post(handler::reindex_handler))
        .route("/health", get(handler::health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
