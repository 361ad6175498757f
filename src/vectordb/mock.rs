use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::vectordb::{ProductHit, ProductPoint, VectorDbError, VectorSearch};

/// In-memory vector store for tests.
///
/// Stores points per collection, scores by cosine similarity, and applies the
/// same category hard-filter as the real store. Counters expose how often each
/// operation ran so callers can assert on cache and retry behavior.
#[derive(Default)]
pub struct MockVectorStore {
    collections: std::sync::RwLock<HashMap<String, MockCollection>>,
    search_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    fail_searches: AtomicBool,
    fail_upserts: AtomicBool,
}

#[derive(Default, Clone)]
struct MockCollection {
    vector_size: u64,
    points: HashMap<u64, StoredPoint>,
}

#[derive(Clone)]
struct StoredPoint {
    point: ProductPoint,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of search calls observed.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of upsert calls observed.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Makes all subsequent searches fail.
    pub fn set_fail_searches(&self, fail: bool) {
        self.fail_searches.store(fail, Ordering::SeqCst);
    }

    /// Makes all subsequent upserts fail.
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.points.len())
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorSearch for MockVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        let collections =
            self.collections
                .read()
                .map_err(|_| VectorDbError::ConnectionFailed {
                    url: "mock".to_string(),
                    message: "lock poisoned".to_string(),
                })?;
        Ok(collections.contains_key(name))
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::CreateCollectionFailed {
                    collection: name.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        collections.insert(
            name.to_string(),
            MockCollection {
                vector_size,
                points: HashMap::new(),
            },
        );

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::DeleteCollectionFailed {
                    collection: name.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        collections.remove(name);
        Ok(())
    }

    async fn upsert_products(
        &self,
        collection: &str,
        points: Vec<ProductPoint>,
    ) -> Result<(), VectorDbError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::UpsertFailed {
                    collection: collection.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        let coll =
            collections
                .get_mut(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        for point in points {
            if point.vector.len() as u64 != coll.vector_size {
                return Err(VectorDbError::UpsertFailed {
                    collection: collection.to_string(),
                    message: format!(
                        "dimension mismatch: expected {}, got {}",
                        coll.vector_size,
                        point.vector.len()
                    ),
                });
            }
            coll.points.insert(point.point_id(), StoredPoint { point });
        }

        Ok(())
    }

    async fn search_products(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        supercategory: &str,
        category: &str,
    ) -> Result<Vec<ProductHit>, VectorDbError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let collections = self
            .collections
            .read()
            .map_err(|_| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let coll =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        let mut hits: Vec<ProductHit> = coll
            .points
            .values()
            .filter(|s| s.point.supercategory == supercategory && s.point.category == category)
            .map(|s| ProductHit {
                sku: s.point.sku.clone(),
                name: s.point.name.clone(),
                brand: s.point.brand.clone(),
                uom: s.point.uom.clone(),
                uom_qty: s.point.uom_qty,
                price: s.point.price,
                specs_json: s.point.specs_json.clone(),
                score: cosine_similarity(&query, &s.point.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        hits.truncate(limit as usize);
        Ok(hits)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(sku: &str, supercategory: &str, category: &str, vector: Vec<f32>) -> ProductPoint {
        ProductPoint {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            brand: None,
            uom: "Each".to_string(),
            uom_qty: 1.0,
            price: 10.0,
            supercategory: supercategory.to_string(),
            category: category.to_string(),
            specs_json: "{}".to_string(),
            vector,
        }
    }

    #[tokio::test]
    async fn test_search_filters_by_category_pair() {
        let store = MockVectorStore::new();
        store.create_collection("products_a", 2).await.unwrap();
        store
            .upsert_products(
                "products_a",
                vec![
                    point("A1", "Office Supplies", "Copy Paper", vec![1.0, 0.0]),
                    point("A2", "Office Supplies", "Cardstock", vec![1.0, 0.0]),
                    point("A3", "Furniture", "Copy Paper", vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store
            .search_products(
                "products_a",
                vec![1.0, 0.0],
                10,
                "Office Supplies",
                "Copy Paper",
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "A1");
        assert_eq!(store.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_search_missing_collection_fails() {
        let store = MockVectorStore::new();
        let err = store
            .search_products("nope", vec![1.0], 10, "a", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, VectorDbError::CollectionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MockVectorStore::new();
        store.create_collection("products_a", 2).await.unwrap();
        store.set_fail_searches(true);
        let err = store
            .search_products("products_a", vec![1.0, 0.0], 10, "a", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, VectorDbError::SearchFailed { .. }));
    }

    #[tokio::test]
    async fn test_delete_collection_removes_points() {
        let store = MockVectorStore::new();
        store.create_collection("products_a", 2).await.unwrap();
        store
            .upsert_products(
                "products_a",
                vec![point("A1", "s", "c", vec![1.0, 0.0])],
            )
            .await
            .unwrap();

        store.delete_collection("products_a").await.unwrap();
        assert!(!store.collection_exists("products_a").await.unwrap());
        assert_eq!(store.point_count("products_a"), None);
    }
}
