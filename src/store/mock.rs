use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::StoreError;
use super::ProductStore;
use crate::model::{CategoryPair, IndexProduct};

/// In-memory product store for tests.
///
/// Seeded with full catalog rows; bullets and specs lookups read from the same
/// seeds. Counters and failure flags let tests assert on lookup behavior and
/// exercise the degraded-enrichment path.
#[derive(Default)]
pub struct MockProductStore {
    products: Mutex<Vec<IndexProduct>>,
    bullets_calls: AtomicUsize,
    specs_calls: AtomicUsize,
    scan_calls: AtomicUsize,
    fail_lookups: AtomicBool,
    scan_delay: Mutex<Option<Duration>>,
}

impl MockProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, products: Vec<IndexProduct>) {
        *self.products.lock() = products;
    }

    pub fn bullets_calls(&self) -> usize {
        self.bullets_calls.load(Ordering::SeqCst)
    }

    pub fn specs_calls(&self) -> usize {
        self.specs_calls.load(Ordering::SeqCst)
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    /// Makes bullets and specs lookups fail.
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Delays full catalog scans, for overlap tests.
    pub fn set_scan_delay(&self, delay: Duration) {
        *self.scan_delay.lock() = Some(delay);
    }

    fn lookup_failure(&self) -> Option<StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            Some(StoreError::QueryFailed {
                message: "injected failure".to_string(),
            })
        } else {
            None
        }
    }
}

#[async_trait]
impl ProductStore for MockProductStore {
    async fn bullets_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, Vec<String>>, StoreError> {
        self.bullets_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.lookup_failure() {
            return Err(err);
        }

        let products = self.products.lock();
        Ok(products
            .iter()
            .filter(|p| skus.contains(&p.sku) && !p.bullets.is_empty())
            .map(|p| (p.sku.clone(), p.bullets.clone()))
            .collect())
    }

    async fn specs_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, BTreeMap<String, String>>, StoreError> {
        self.specs_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.lookup_failure() {
            return Err(err);
        }

        let products = self.products.lock();
        Ok(products
            .iter()
            .filter(|p| skus.contains(&p.sku) && !p.specs.is_empty())
            .map(|p| (p.sku.clone(), p.specs.clone()))
            .collect())
    }

    async fn all_active_products(&self) -> Result<Vec<IndexProduct>, StoreError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.scan_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self.products.lock().clone())
    }

    async fn categories(&self) -> Result<Vec<CategoryPair>, StoreError> {
        let products = self.products.lock();
        let mut pairs: Vec<CategoryPair> = Vec::new();
        for p in products.iter() {
            let pair = CategoryPair {
                supercategory: p.supercategory.clone(),
                category: p.category.clone(),
            };
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs.sort_by(|a, b| {
            (&a.supercategory, &a.category).cmp(&(&b.supercategory, &b.category))
        });
        Ok(pairs)
    }
}
