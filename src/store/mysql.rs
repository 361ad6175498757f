use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Row;
use tracing::debug;

use super::error::StoreError;
use super::ProductStore;
use crate::model::{CategoryPair, IndexProduct};

/// Product store backed by the MySQL catalog.
///
/// Prices and package quantities are stored as DECIMAL columns; every numeric
/// read goes through `CAST(.. AS DOUBLE)` so rows decode as `f64` directly.
#[derive(Clone)]
pub struct MySqlProductStore {
    pool: MySqlPool,
}

impl MySqlProductStore {
    /// Connects a bounded pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionFailed {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Checks the connection with a trivial query.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn in_placeholders(count: usize) -> String {
        vec!["?"; count].join(",")
    }
}

#[async_trait]
impl ProductStore for MySqlProductStore {
    async fn bullets_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, Vec<String>>, StoreError> {
        if skus.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT sku, bullet_text FROM product_bullets \
             WHERE sku IN ({}) ORDER BY sku, display_order",
            Self::in_placeholders(skus.len())
        );

        let mut query = sqlx::query(&sql);
        for sku in skus {
            query = query.bind(sku);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut bullets: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let sku: String = row.try_get("sku")?;
            let text: String = row.try_get("bullet_text")?;
            bullets.entry(sku).or_default().push(text);
        }

        Ok(bullets)
    }

    async fn specs_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, BTreeMap<String, String>>, StoreError> {
        if skus.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT ps.sku, sn.name, ps.spec_value \
             FROM product_specifications ps \
             JOIN specification_names sn ON ps.spec_name_id = sn.id \
             WHERE ps.sku IN ({})",
            Self::in_placeholders(skus.len())
        );

        let mut query = sqlx::query(&sql);
        for sku in skus {
            query = query.bind(sku);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut specs: HashMap<String, BTreeMap<String, String>> = HashMap::new();
        for row in rows {
            let sku: String = row.try_get("sku")?;
            let name: String = row.try_get("name")?;
            let value: String = row.try_get("spec_value")?;
            specs.entry(sku).or_default().insert(name, value);
        }

        Ok(specs)
    }

    async fn all_active_products(&self) -> Result<Vec<IndexProduct>, StoreError> {
        let rows = sqlx::query(
            "SELECT p.sku, p.name, p.brand_name, p.description, \
                    p.uom, CAST(p.uom_qty AS DOUBLE) AS uom_qty, \
                    CAST(p.web_price AS DOUBLE) AS web_price, \
                    CAST(p.customer_price AS DOUBLE) AS customer_price, \
                    c.supercategory, c.category, c.class \
             FROM products p \
             LEFT JOIN categories c ON p.sku = c.sku \
             WHERE p.active = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(IndexProduct {
                sku: row.try_get("sku")?,
                name: row.try_get("name")?,
                brand: row.try_get("brand_name")?,
                description: row.try_get("description")?,
                uom: row
                    .try_get::<Option<String>, _>("uom")?
                    .unwrap_or_else(|| "Each".to_string()),
                uom_qty: row.try_get::<Option<f64>, _>("uom_qty")?.unwrap_or(1.0),
                web_price: row.try_get("web_price")?,
                customer_price: row.try_get("customer_price")?,
                supercategory: row
                    .try_get::<Option<String>, _>("supercategory")?
                    .unwrap_or_default(),
                category: row
                    .try_get::<Option<String>, _>("category")?
                    .unwrap_or_default(),
                class: row.try_get("class")?,
                bullets: Vec::new(),
                specs: BTreeMap::new(),
            });
        }

        debug!(count = products.len(), "scanned active products");

        // Bulk-attach bullets and specs, same two queries enrichment uses.
        let skus: Vec<String> = products.iter().map(|p| p.sku.clone()).collect();
        if skus.is_empty() {
            return Ok(products);
        }

        let mut bullets = self.bullets_by_skus(&skus).await?;
        let mut specs = self.specs_by_skus(&skus).await?;

        for product in &mut products {
            if let Some(b) = bullets.remove(&product.sku) {
                product.bullets = b;
            }
            if let Some(s) = specs.remove(&product.sku) {
                product.specs = s;
            }
        }

        Ok(products)
    }

    async fn categories(&self) -> Result<Vec<CategoryPair>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT supercategory, category FROM categories \
             ORDER BY supercategory, category",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            pairs.push(CategoryPair {
                supercategory: row.try_get("supercategory")?,
                category: row.try_get("category")?,
            });
        }

        Ok(pairs)
    }
}
