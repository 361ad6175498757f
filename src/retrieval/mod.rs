//! Semantic candidate retrieval.
//!
//! Embeds the source item's query text and searches the active index
//! generation, hard-filtered to the request's category pair. Returns slim
//! [`Candidate`] projections sized for the ranking prompt.

pub mod error;

pub use error::RetrievalError;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::constants::SLIM_SPEC_LIMIT;
use crate::embedding::Embedder;
use crate::index::GenerationRegistry;
use crate::model::{Candidate, SourceItem};
use crate::vectordb::{ProductHit, VectorSearch};

pub struct CandidateRetriever {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorSearch>,
    registry: Arc<GenerationRegistry>,
    top_k: u64,
    timeout: Duration,
}

impl CandidateRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorSearch>,
        registry: Arc<GenerationRegistry>,
        top_k: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            vectors,
            registry,
            top_k,
            timeout,
        }
    }

    /// Retrieves up to `top_k` candidates for the source item.
    ///
    /// The generation name is resolved once at the start, so a rebuild that
    /// swaps the pointer mid-flight never splits one retrieval across two
    /// generations.
    pub async fn retrieve(&self, item: &SourceItem) -> Result<Vec<Candidate>, RetrievalError> {
        let generation = self
            .registry
            .current()
            .await
            .ok_or(RetrievalError::NoActiveGeneration)?;

        let vector = self
            .with_deadline(self.embedder.embed(&item.query_text()))
            .await??;

        let hits = self
            .with_deadline(self.vectors.search_products(
                &generation,
                vector,
                self.top_k,
                &item.supercategory,
                &item.category,
            ))
            .await??;

        debug!(
            generation = %generation,
            hits = hits.len(),
            supercategory = %item.supercategory,
            category = %item.category,
            "retrieved candidates"
        );

        Ok(hits.into_iter().map(slim_candidate).collect())
    }

    async fn with_deadline<F, T>(&self, fut: F) -> Result<T, RetrievalError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| RetrievalError::Timeout {
                seconds: self.timeout.as_secs(),
            })
    }
}

/// Projects a search hit into the slim candidate shape, keeping at most
/// [`SLIM_SPEC_LIMIT`] specification pairs.
fn slim_candidate(hit: ProductHit) -> Candidate {
    let specs: Vec<(String, String)> = hit
        .specs()
        .into_iter()
        .take(SLIM_SPEC_LIMIT)
        .collect();

    Candidate {
        sku: hit.sku,
        name: hit.name,
        brand: hit.brand,
        uom: hit.uom,
        uom_qty: hit.uom_qty,
        price: hit.price,
        specs,
        score: hit.score,
    }
}
