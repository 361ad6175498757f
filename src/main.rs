//! Subswap HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use subswap::cache::TtlCache;
use subswap::config::Config;
use subswap::embedding::{Embedder, HttpEmbedder};
use subswap::enrich::Enricher;
use subswap::gateway::{AppState, create_router};
use subswap::index::{GenerationRegistry, Indexer};
use subswap::pipeline::Pipeline;
use subswap::ranking::{GenaiRankingModel, Ranker, RankingModel};
use subswap::ratelimit::RateLimiter;
use subswap::retrieval::CandidateRetriever;
use subswap::store::{MySqlProductStore, ProductStore};
use subswap::vectordb::{QdrantStore, VectorSearch};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        rank_model = %config.rank_model,
        "Subswap starting"
    );

    let qdrant = QdrantStore::new(&config.qdrant_url)?;
    qdrant.health_check().await?;
    let vectors: Arc<dyn VectorSearch> = Arc::new(qdrant.clone());

    let mysql = MySqlProductStore::connect(&config.mysql_url, 10).await?;
    mysql.health_check().await?;
    let store: Arc<dyn ProductStore> = Arc::new(mysql);

    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
        &config.embed_url,
        &config.embed_model,
        config.embed_dim,
        config.collaborator_timeout,
    )?);

    let registry = Arc::new(GenerationRegistry::new());
    if let Some(name) = &config.initial_collection {
        if qdrant.collection_exists(name).await? {
            registry.activate(name.clone()).await;
            tracing::info!(generation = %name, "adopted existing index generation");
        } else {
            tracing::warn!(
                generation = %name,
                "configured initial collection does not exist, starting without an active generation"
            );
        }
    }

    let retriever = CandidateRetriever::new(
        embedder.clone(),
        vectors.clone(),
        registry.clone(),
        config.top_k_vector,
        config.collaborator_timeout,
    );

    let ranking_model: Arc<dyn RankingModel> = Arc::new(GenaiRankingModel::new(&config.rank_model));
    let ranker = Ranker::new(ranking_model, config.top_k_final, config.collaborator_timeout);
    let enricher = Enricher::new(store.clone(), config.collaborator_timeout);

    let pipeline = Arc::new(Pipeline::new(
        RateLimiter::new(config.rate_limit),
        TtlCache::new(config.result_ttl),
        TtlCache::new(config.candidate_ttl),
        retriever,
        ranker,
        enricher,
    ));

    let indexer = Arc::new(Indexer::new(
        store.clone(),
        embedder,
        vectors,
        registry.clone(),
    ));

    let state = AppState::new(pipeline, indexer, registry, store);
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Subswap shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
