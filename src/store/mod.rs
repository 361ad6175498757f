//! Relational product catalog access.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod mysql;

pub use error::StoreError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockProductStore;
pub use mysql::MySqlProductStore;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::model::{CategoryPair, IndexProduct};

/// Async interface over the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Marketing bullets for a set of SKUs, keyed by SKU, in display order.
    async fn bullets_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, Vec<String>>, StoreError>;

    /// Specification pairs for a set of SKUs, keyed by SKU.
    async fn specs_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, BTreeMap<String, String>>, StoreError>;

    /// Full scan of active products, with bullets and specs attached.
    async fn all_active_products(&self) -> Result<Vec<IndexProduct>, StoreError>;

    /// Distinct (supercategory, category) pairs.
    async fn categories(&self) -> Result<Vec<CategoryPair>, StoreError>;
}
