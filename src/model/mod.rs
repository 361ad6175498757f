//! Core domain types shared across the pipeline.
//!
//! The boundary between what the ranking model decides and what this process
//! computes is deliberate: [`RankedChoice`] carries only the fields the model
//! must determine (classification, quantity, justification text); all pricing
//! math lives in [`RankedSubstitute`] and is computed locally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Competitor product as submitted by the client. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub supercategory: String,
    pub category: String,
    pub quantity: f64,
    #[serde(default)]
    pub quantity_unit: String,
    /// Competitor price per purchased package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// Total competitor spend; overrides `unit_price` when both are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

impl SourceItem {
    /// Text embedded for nearest-neighbor retrieval.
    pub fn query_text(&self) -> String {
        if self.description.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{}\n{}", self.name, self.description)
        }
    }

    /// Competitor total spend, when any competitor price was supplied.
    ///
    /// `total_price` wins when present; otherwise the per-package `unit_price`
    /// stands in for a single-package purchase. Zero and negative prices are
    /// treated as absent. `None` means savings fields are suppressed and the
    /// response is quote-only.
    pub fn their_total_spend(&self) -> Option<f64> {
        self.total_price
            .filter(|p| *p > 0.0)
            .or_else(|| self.unit_price.filter(|p| *p > 0.0))
    }

    /// Competitor per-package price, if supplied.
    pub fn their_unit_price(&self) -> Option<f64> {
        self.unit_price.filter(|p| *p > 0.0)
    }
}

/// Slim internal product projection returned by retrieval.
///
/// No description or marketing bullets: the projection exists to bound the
/// ranking prompt. Lives only within one pipeline invocation and cache entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Unit of measure, e.g. `"Sheets"`.
    pub uom: String,
    /// Package quantity in `uom` units, e.g. `500.0`.
    pub uom_qty: f64,
    /// Our price per package, captured at index time.
    pub price: f64,
    /// Bounded top-N specification pairs.
    pub specs: Vec<(String, String)>,
    /// Similarity score from the vector search.
    pub score: f32,
}

impl Candidate {
    /// Human-readable package label, e.g. `"500 Sheets"`.
    pub fn uom_label(&self) -> String {
        format!("{} {}", format_quantity(self.uom_qty), self.uom)
    }
}

/// Unit classification of a product attribute.
///
/// Divisible units scale by quantity ceiling (sheets, feet, ml); absolute
/// units must match exactly (tabs, drawers, ports) and are never ratio-compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitType {
    Divisible,
    Absolute,
}

/// One accepted candidate as returned by the ranking model.
///
/// Only fields the model must determine; anything derivable from the catalog
/// is recomputed locally and never trusted from the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedChoice {
    pub sku: String,
    pub rank: u32,
    pub reason: String,
    pub unit_type: UnitType,
    pub qty_needed: u32,
    pub comparison_notes: String,
}

/// Top-level schema of the structured ranking response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutput {
    pub substitutes: Vec<RankedChoice>,
}

/// A ranked substitute with locally computed spend and savings figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSubstitute {
    pub rank: u32,
    pub sku: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    /// Package label of the substitute, e.g. `"500 Sheets"`.
    pub candidate_uom: String,
    pub unit_type: UnitType,
    pub qty_needed: u32,
    pub our_unit_price: f64,
    pub our_total_spend: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub their_unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub their_total_spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_percentage: Option<f64>,
    pub reason: String,
    pub comparison_notes: String,
}

/// A ranked substitute plus descriptive catalog attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSubstitute {
    #[serde(flatten)]
    pub substitute: RankedSubstitute,
    pub product_details: BTreeMap<String, serde_json::Value>,
    pub bullets: Vec<String>,
    pub specs: BTreeMap<String, String>,
}

/// Final response composed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionResponse {
    pub source_item: SourceItem,
    pub candidates_evaluated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub substitutes: Vec<EnrichedSubstitute>,
    /// Always freshly computed, even on result-cache hits.
    pub requests_remaining: u32,
}

/// A distinct (supercategory, category) pair for the filtering UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPair {
    pub supercategory: String,
    pub category: String,
}

/// Full product row read from the relational store for indexing.
#[derive(Debug, Clone)]
pub struct IndexProduct {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub uom: String,
    pub uom_qty: f64,
    pub web_price: Option<f64>,
    pub customer_price: Option<f64>,
    pub supercategory: String,
    pub category: String,
    pub class: Option<String>,
    pub bullets: Vec<String>,
    pub specs: BTreeMap<String, String>,
}

impl IndexProduct {
    /// Effective price: customer price when set, web price otherwise.
    pub fn effective_price(&self) -> f64 {
        self.customer_price
            .filter(|p| *p > 0.0)
            .or_else(|| self.web_price.filter(|p| *p > 0.0))
            .unwrap_or(0.0)
    }

    /// Builds the rich text document embedded for this product.
    pub fn document(&self) -> String {
        let mut parts = vec![
            format!("Product: {}", self.name),
            format!("Brand: {}", self.brand.as_deref().unwrap_or("N/A")),
            format!("UOM: {} {}", format_quantity(self.uom_qty), self.uom),
            format!("Customer Price: ${}", self.effective_price()),
        ];
        if let Some(desc) = &self.description
            && !desc.trim().is_empty()
        {
            parts.push(format!("Description: {desc}"));
        }
        if !self.bullets.is_empty() {
            parts.push(format!("Features: {}", self.bullets.join("; ")));
        }
        if !self.specs.is_empty() {
            let spec_str = self
                .specs
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; ");
            parts.push(format!("Specifications: {spec_str}"));
        }
        parts.join("\n")
    }
}

/// Rounds to two decimal places (currency precision).
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a package quantity without a trailing `.0` for whole numbers.
#[inline]
pub fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{qty}")
    }
}
