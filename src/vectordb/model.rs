use std::collections::BTreeMap;

use qdrant_client::qdrant::ScoredPoint;

use crate::fingerprint::hash_to_u64;
use crate::model::IndexProduct;

/// A product ready for upsert into an index generation.
#[derive(Debug, Clone)]
pub struct ProductPoint {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub uom: String,
    pub uom_qty: f64,
    pub price: f64,
    pub supercategory: String,
    pub category: String,
    /// Specification pairs serialized as a JSON object string.
    pub specs_json: String,
    pub vector: Vec<f32>,
}

impl ProductPoint {
    /// Builds a point from a catalog row and its embedding.
    pub fn from_product(product: &IndexProduct, vector: Vec<f32>) -> Self {
        Self {
            sku: product.sku.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            uom: product.uom.clone(),
            uom_qty: product.uom_qty,
            price: product.effective_price(),
            supercategory: product.supercategory.clone(),
            category: product.category.clone(),
            specs_json: serde_json::to_string(&product.specs).unwrap_or_else(|_| "{}".to_string()),
            vector,
        }
    }

    /// Stable numeric point id derived from the SKU.
    pub fn point_id(&self) -> u64 {
        hash_to_u64(self.sku.as_bytes())
    }
}

/// A scored product returned by a similarity search.
#[derive(Debug, Clone)]
pub struct ProductHit {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub uom: String,
    pub uom_qty: f64,
    pub price: f64,
    pub specs_json: String,
    pub score: f32,
}

impl ProductHit {
    /// Extracts a hit from a Qdrant scored point; `None` if the payload is
    /// missing the sku (a point this process never wrote).
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let payload = point.payload;

        let sku = payload.get("sku").and_then(|v| v.as_str())?.to_string();

        let name = payload
            .get("name")
            .and_then(|v| v.as_str())
            .map(String::as_str)
            .unwrap_or_default()
            .to_string();

        let brand = payload
            .get("brand")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let uom = payload
            .get("uom")
            .and_then(|v| v.as_str())
            .map(String::as_str)
            .unwrap_or("Each")
            .to_string();

        let uom_qty = payload
            .get("uom_qty")
            .and_then(|v| v.as_double())
            .unwrap_or(1.0);

        let price = payload
            .get("price")
            .and_then(|v| v.as_double())
            .unwrap_or(0.0);

        let specs_json = payload
            .get("specs")
            .and_then(|v| v.as_str())
            .map(String::as_str)
            .unwrap_or("{}")
            .to_string();

        Some(ProductHit {
            sku,
            name,
            brand,
            uom,
            uom_qty,
            price,
            specs_json,
            score: point.score,
        })
    }

    /// Parses the stored specification pairs; empty map on malformed payload.
    pub fn specs(&self) -> BTreeMap<String, String> {
        serde_json::from_str(&self.specs_json).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn product() -> IndexProduct {
        IndexProduct {
            sku: "P100".to_string(),
            name: "Recycled Copy Paper".to_string(),
            brand: Some("TruRed".to_string()),
            description: None,
            uom: "Sheets".to_string(),
            uom_qty: 500.0,
            web_price: Some(11.49),
            customer_price: Some(9.49),
            supercategory: "Office Supplies".to_string(),
            category: "Copy Paper".to_string(),
            class: None,
            bullets: Vec::new(),
            specs: BTreeMap::from([("Size".to_string(), "Letter".to_string())]),
        }
    }

    #[test]
    fn test_point_id_is_stable_per_sku() {
        let point = ProductPoint::from_product(&product(), vec![0.0; 4]);
        assert_eq!(point.point_id(), point.point_id());

        let mut other = product();
        other.sku = "P101".to_string();
        let other_point = ProductPoint::from_product(&other, vec![0.0; 4]);
        assert_ne!(point.point_id(), other_point.point_id());
    }

    #[test]
    fn test_from_product_uses_effective_price_and_specs_json() {
        let point = ProductPoint::from_product(&product(), vec![0.0; 4]);
        assert_eq!(point.price, 9.49);
        let parsed: BTreeMap<String, String> = serde_json::from_str(&point.specs_json).unwrap();
        assert_eq!(parsed.get("Size").map(String::as_str), Some("Letter"));
    }
}
