use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::gateway::error::ApiError;
use crate::gateway::state::AppState;
use crate::index::IndexReport;
use crate::model::{CategoryPair, SourceItem, SubstitutionResponse};

/// POST /substitute
#[instrument(skip(state, item), fields(category = %item.category))]
pub async fn substitute_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(item): Json<SourceItem>,
) -> Result<Json<SubstitutionResponse>, ApiError> {
    let identity = addr.ip().to_string();
    let response = state.pipeline.find_substitutes(&identity, item).await?;
    Ok(Json(response))
}

/// GET /categories
pub async fn categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryPair>>, ApiError> {
    let pairs = state.store.categories().await?;
    Ok(Json(pairs))
}

/// POST /index
#[instrument(skip(state))]
pub async fn reindex_handler(
    State(state): State<AppState>,
) -> Result<Json<IndexReport>, ApiError> {
    info!("index rebuild requested");
    let report = state.indexer.reindex().await?;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_generation: Option<String>,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_generation: state.registry.current().await,
    })
}
