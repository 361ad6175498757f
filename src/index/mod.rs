//! Blue-green catalog indexing.
//!
//! Every rebuild writes into a fresh, uniquely named collection (a
//! "generation") while searches keep hitting the previous one. Only after the
//! new generation is fully populated does the registry pointer swap, and the
//! old collection is dropped. A failed build never touches the active pointer.

pub mod error;

pub use error::IndexError;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::{GENERATION_PREFIX, INDEX_BATCH_SIZE};
use crate::embedding::Embedder;
use crate::store::ProductStore;
use crate::vectordb::{ProductPoint, VectorSearch};

/// Tracks which index generation searches should hit.
///
/// `None` until the first successful rebuild (or adoption of an existing
/// collection at startup).
#[derive(Default)]
pub struct GenerationRegistry {
    current: RwLock<Option<String>>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the active generation, if any.
    pub async fn current(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Atomically makes `name` the active generation, returning the previous one.
    pub async fn activate(&self, name: String) -> Option<String> {
        self.current.write().await.replace(name)
    }
}

/// Summary of a completed rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    pub generation: Option<String>,
    pub products_indexed: usize,
    pub batches: usize,
}

/// Rebuilds the vector index from the relational catalog.
pub struct Indexer {
    store: Arc<dyn ProductStore>,
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorSearch>,
    registry: Arc<GenerationRegistry>,
    rebuild: Mutex<()>,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn ProductStore>,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorSearch>,
        registry: Arc<GenerationRegistry>,
    ) -> Self {
        Self {
            store,
            embedder,
            vectors,
            registry,
            rebuild: Mutex::new(()),
        }
    }

    /// Runs one full rebuild. Only one rebuild may run at a time; overlapping
    /// calls fail fast with [`IndexError::InProgress`].
    pub async fn reindex(&self) -> Result<IndexReport, IndexError> {
        let _guard = self.rebuild.try_lock().map_err(|_| IndexError::InProgress)?;

        let products = self.store.all_active_products().await?;
        if products.is_empty() {
            info!("catalog scan returned no active products, keeping current generation");
            return Ok(IndexReport {
                generation: self.registry.current().await,
                products_indexed: 0,
                batches: 0,
            });
        }

        let generation = format!("{}{}", GENERATION_PREFIX, Uuid::new_v4().simple());
        self.vectors
            .create_collection(&generation, self.embedder.dim() as u64)
            .await?;

        info!(
            generation = %generation,
            products = products.len(),
            "building index generation"
        );

        let mut batches = 0usize;
        for chunk in products.chunks(INDEX_BATCH_SIZE) {
            if let Err(err) = self.index_batch(&generation, chunk).await {
                warn!(generation = %generation, error = %err, "rebuild failed, discarding generation");
                if let Err(del) = self.vectors.delete_collection(&generation).await {
                    warn!(generation = %generation, error = %del, "failed to drop partial generation");
                }
                return Err(err);
            }
            batches += 1;
        }

        let previous = self.registry.activate(generation.clone()).await;
        info!(
            generation = %generation,
            previous = previous.as_deref().unwrap_or("none"),
            products = products.len(),
            "index generation activated"
        );

        if let Some(old) = previous
            && old != generation
            && let Err(err) = self.vectors.delete_collection(&old).await
        {
            warn!(generation = %old, error = %err, "failed to drop retired generation");
        }

        Ok(IndexReport {
            generation: Some(generation),
            products_indexed: products.len(),
            batches,
        })
    }

    async fn index_batch(
        &self,
        generation: &str,
        chunk: &[crate::model::IndexProduct],
    ) -> Result<(), IndexError> {
        let documents: Vec<String> = chunk.iter().map(|p| p.document()).collect();
        let vectors = self.embedder.embed_batch(&documents).await?;

        let points: Vec<ProductPoint> = chunk
            .iter()
            .zip(vectors)
            .map(|(product, vector)| ProductPoint::from_product(product, vector))
            .collect();

        self.vectors.upsert_products(generation, points).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::embedding::StubEmbedder;
    use crate::store::MockProductStore;
    use crate::vectordb::MockVectorStore;

    fn product(sku: &str) -> crate::model::IndexProduct {
        crate::model::IndexProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            brand: None,
            description: None,
            uom: "Each".to_string(),
            uom_qty: 1.0,
            web_price: Some(5.0),
            customer_price: None,
            supercategory: "Office Supplies".to_string(),
            category: "Copy Paper".to_string(),
            class: None,
            bullets: Vec::new(),
            specs: BTreeMap::new(),
        }
    }

    fn indexer(
        store: Arc<MockProductStore>,
        vectors: Arc<MockVectorStore>,
        registry: Arc<GenerationRegistry>,
    ) -> Indexer {
        Indexer::new(store, Arc::new(StubEmbedder::new(16)), vectors, registry)
    }

    #[tokio::test]
    async fn test_reindex_activates_new_generation() {
        let store = Arc::new(MockProductStore::new());
        store.seed(vec![product("A1"), product("A2")]);
        let vectors = Arc::new(MockVectorStore::new());
        let registry = Arc::new(GenerationRegistry::new());

        let report = indexer(store, vectors.clone(), registry.clone())
            .reindex()
            .await
            .unwrap();

        assert_eq!(report.products_indexed, 2);
        assert_eq!(report.batches, 1);
        let active = registry.current().await.unwrap();
        assert_eq!(report.generation.as_deref(), Some(active.as_str()));
        assert_eq!(vectors.point_count(&active), Some(2));
    }

    #[tokio::test]
    async fn test_reindex_drops_retired_generation() {
        let store = Arc::new(MockProductStore::new());
        store.seed(vec![product("A1")]);
        let vectors = Arc::new(MockVectorStore::new());
        let registry = Arc::new(GenerationRegistry::new());
        let indexer = indexer(store, vectors.clone(), registry.clone());

        let first = indexer.reindex().await.unwrap().generation.unwrap();
        let second = indexer.reindex().await.unwrap().generation.unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.current().await.as_deref(), Some(second.as_str()));
        assert_eq!(vectors.collection_names(), vec![second]);
    }

    #[tokio::test]
    async fn test_empty_catalog_keeps_current_generation() {
        let store = Arc::new(MockProductStore::new());
        let vectors = Arc::new(MockVectorStore::new());
        let registry = Arc::new(GenerationRegistry::new());
        registry.activate("products_boot".to_string()).await;

        let report = indexer(store, vectors, registry.clone())
            .reindex()
            .await
            .unwrap();

        assert_eq!(report.products_indexed, 0);
        assert_eq!(report.generation.as_deref(), Some("products_boot"));
        assert_eq!(registry.current().await.as_deref(), Some("products_boot"));
    }

    #[tokio::test]
    async fn test_concurrent_reindex_rejected() {
        let store = Arc::new(MockProductStore::new());
        store.seed(vec![product("A1")]);
        store.set_scan_delay(std::time::Duration::from_millis(200));
        let vectors = Arc::new(MockVectorStore::new());
        let registry = Arc::new(GenerationRegistry::new());
        let indexer = Arc::new(indexer(store, vectors, registry));

        let background = {
            let indexer = indexer.clone();
            tokio::spawn(async move { indexer.reindex().await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let overlapping = indexer.reindex().await;
        assert!(matches!(overlapping, Err(IndexError::InProgress)));

        assert!(background.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_failed_build_keeps_pointer_and_drops_partial() {
        let store = Arc::new(MockProductStore::new());
        store.seed(vec![product("A1")]);
        let vectors = Arc::new(MockVectorStore::new());
        vectors.create_collection("products_old", 16).await.unwrap();
        let registry = Arc::new(GenerationRegistry::new());
        registry.activate("products_old".to_string()).await;

        vectors.set_fail_upserts(true);
        let result = indexer(store, vectors.clone(), registry.clone())
            .reindex()
            .await;

        assert!(matches!(result, Err(IndexError::VectorDb(_))));
        assert_eq!(registry.current().await.as_deref(), Some("products_old"));
        assert_eq!(vectors.collection_names(), vec!["products_old".to_string()]);
    }
}
