use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeleteCollectionBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};

use super::error::VectorDbError;
use super::model::{ProductHit, ProductPoint};

/// Async interface over the product vector index.
///
/// One implementation talks to Qdrant; tests substitute an in-memory mock.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Returns `true` if the collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError>;

    /// Creates a collection with cosine distance.
    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError>;

    /// Deletes a collection and all its points.
    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError>;

    /// Upserts product points into a collection.
    async fn upsert_products(
        &self,
        collection: &str,
        points: Vec<ProductPoint>,
    ) -> Result<(), VectorDbError>;

    /// Searches a collection, hard-filtered to the given category pair.
    async fn search_products(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        supercategory: &str,
        category: &str,
    ) -> Result<Vec<ProductHit>, VectorDbError>;
}

#[derive(Clone)]
/// Direct Qdrant client wrapper.
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Creates a client for `url`.
    pub fn new(url: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl VectorSearch for QdrantStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        self.client.collection_exists(name).await.map_err(|e| {
            VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            }
        })
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        let vectors_config = VectorParamsBuilder::new(vector_size, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.client
            .delete_collection(DeleteCollectionBuilder::new(name))
            .await
            .map_err(|e| VectorDbError::DeleteCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn upsert_products(
        &self,
        collection: &str,
        points: Vec<ProductPoint>,
    ) -> Result<(), VectorDbError> {
        if points.is_empty() {
            return Ok(());
        }

        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                let id = p.point_id();
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("sku".to_string(), p.sku.into());
                payload.insert("name".to_string(), p.name.into());
                if let Some(brand) = p.brand {
                    payload.insert("brand".to_string(), brand.into());
                }
                payload.insert("uom".to_string(), p.uom.into());
                payload.insert("uom_qty".to_string(), p.uom_qty.into());
                payload.insert("price".to_string(), p.price.into());
                payload.insert("supercategory".to_string(), p.supercategory.into());
                payload.insert("category".to_string(), p.category.into());
                payload.insert("specs".to_string(), p.specs_json.into());

                PointStruct::new(id, p.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

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
        let filter = Filter::must([
            Condition::matches("supercategory", supercategory.to_string()),
            Condition::matches("category", category.to_string()),
        ]);

        let search_builder = SearchPointsBuilder::new(collection, query, limit)
            .filter(filter)
            .with_payload(true);

        let search_result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let hits = search_result
            .result
            .into_iter()
            .filter_map(ProductHit::from_scored_point)
            .collect();

        Ok(hits)
    }
}
