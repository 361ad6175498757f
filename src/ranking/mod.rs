//! AI-assisted candidate ranking.
//!
//! The model receives the source item and the slim candidate projections, and
//! returns only what it must decide: which SKUs qualify, the unit
//! classification, the purchase quantity, and the justification text. Every
//! numeric claim it makes is re-derived locally before use.

pub mod error;

pub use error::RankingError;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatOptions, ChatRequest, ChatResponseFormat, JsonSpec};
use tracing::warn;

use crate::model::{Candidate, RankedChoice, RankingOutput, SourceItem, UnitType, format_quantity};

/// Structured-output ranking model.
#[async_trait]
pub trait RankingModel: Send + Sync {
    /// Sends the prompt and returns the raw structured-output text.
    async fn rank(&self, prompt: &str) -> Result<String, RankingError>;
}

/// JSON schema the model's response must conform to.
fn ranking_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "substitutes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "sku": {
                            "type": "string",
                            "description": "Product SKU of the chosen substitute"
                        },
                        "rank": {
                            "type": "integer",
                            "description": "Rank starting at 1, 1 being best"
                        },
                        "reason": {
                            "type": "string",
                            "description": "Why this is a good substitute: functional match, spec comparison, value"
                        },
                        "unit_type": {
                            "type": "string",
                            "enum": ["DIVISIBLE", "ABSOLUTE"],
                            "description": "DIVISIBLE if the quantity unit can be scaled (sheets, feet, ml, oz), ABSOLUTE if it cannot (tabs, drawers, ports)"
                        },
                        "qty_needed": {
                            "type": "integer",
                            "description": "How many packages of the candidate cover the requested quantity, rounded up. 1 for ABSOLUTE units with matching specs."
                        },
                        "comparison_notes": {
                            "type": "string",
                            "description": "Step-by-step calculation of qty_needed including any unit conversions. For ABSOLUTE units, why the specs are equivalent."
                        }
                    },
                    "required": ["sku", "rank", "reason", "unit_type", "qty_needed", "comparison_notes"]
                }
            }
        },
        "required": ["substitutes"]
    })
}

/// Ranking model backed by a genai chat provider with schema enforcement.
pub struct GenaiRankingModel {
    client: Client,
    model: String,
}

impl GenaiRankingModel {
    pub fn new(model: &str) -> Self {
        Self {
            client: Client::default(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl RankingModel for GenaiRankingModel {
    async fn rank(&self, prompt: &str) -> Result<String, RankingError> {
        let chat_req = ChatRequest::from_user(prompt);
        let options = ChatOptions::default().with_response_format(ChatResponseFormat::JsonSpec(
            JsonSpec::new("substitution_ranking", ranking_schema()),
        ));

        let response = self
            .client
            .exec_chat(&self.model, chat_req, Some(&options))
            .await
            .map_err(|e| RankingError::ModelCall {
                message: e.to_string(),
            })?;

        response
            .first_text()
            .map(|t| t.to_string())
            .ok_or_else(|| RankingError::InvalidResponse {
                message: "response contained no text".to_string(),
            })
    }
}

/// Runs the ranking model and validates its output against the candidate set.
pub struct Ranker {
    model: Arc<dyn RankingModel>,
    top_k_final: usize,
    timeout: Duration,
}

impl Ranker {
    pub fn new(model: Arc<dyn RankingModel>, top_k_final: usize, timeout: Duration) -> Self {
        Self {
            model,
            top_k_final,
            timeout,
        }
    }

    /// Ranks candidates for the source item. May return fewer choices than
    /// `top_k_final`, or none, when the model rejects unsuitable candidates.
    pub async fn rank(
        &self,
        item: &SourceItem,
        candidates: &[Candidate],
    ) -> Result<Vec<RankedChoice>, RankingError> {
        let prompt = build_prompt(item, candidates, self.top_k_final);

        let raw = tokio::time::timeout(self.timeout, self.model.rank(&prompt))
            .await
            .map_err(|_| RankingError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        let output: RankingOutput =
            serde_json::from_str(&raw).map_err(|e| RankingError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(validate_choices(
            output.substitutes,
            item,
            candidates,
            self.top_k_final,
        ))
    }
}

/// Builds the ranking prompt from the source item and slim candidates.
fn build_prompt(item: &SourceItem, candidates: &[Candidate], top_k_final: usize) -> String {
    let candidates_info = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("--- Candidate {} (SKU: {}) ---\n{}", i + 1, c.sku, candidate_block(c)))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a product substitution expert for an office/industrial supply company.\n\
         \n\
         A user wants to find substitutes for a product they are currently buying.\n\
         \n\
         SOURCE ITEM (user-provided):\n\
         - Name: {name}\n\
         - Description: {description}\n\
         - Supercategory: {supercategory}\n\
         - Category: {category}\n\
         - Quantity Needed: {quantity} {quantity_unit}\n\
         \n\
         CANDIDATE PRODUCTS FROM OUR CATALOG:\n\
         {candidates_info}\n\
         \n\
         CRITICAL RULES FOR UNIT COMPARISON:\n\
         \n\
         1. CLASSIFY each product attribute as DIVISIBLE or ABSOLUTE:\n\
            - DIVISIBLE units CAN be scaled/split: sheets, pages, rolls, feet, inches, yards, meters, ml, oz, lbs, sq ft, etc.\n\
            - ABSOLUTE units CANNOT be scaled: tabs (in a folder), compartments, drawers, holes, ports, pockets, dividers, slots, buttons, keys, etc.\n\
         \n\
         2. For ABSOLUTE attributes:\n\
            - A 24-tab folder is NOT comparable to a 12-tab folder by doing 24/12 ratio. They are fundamentally different products.\n\
            - The candidate MUST have the SAME or very similar absolute spec to be a valid substitute.\n\
            - Do NOT include candidates with mismatched absolute specs.\n\
         \n\
         3. For DIVISIBLE units, calculate qty_needed (always round UP to next whole number):\n\
            - Example: User buys 500 sheets. Candidate sells 5000 sheets/case. qty_needed = ceil(500 / 5000) = 1.\n\
            - Example: User buys 2000 sheets. Candidate sells 500 sheets/ream. qty_needed = ceil(2000 / 500) = 4.\n\
            - For dimensional products, CONVERT to common base units first: feet -> inches (x12), yards -> inches (x36), meters -> inches (x39.37), cm -> inches (x0.3937).\n\
         \n\
         4. RANKING rule:\n\
            - Among functionally suitable candidates (same purpose, matching absolute specs), rank strictly by lowest total spend (qty_needed * candidate price), ascending.\n\
            - Package size and brand are NOT ranking factors. A larger or smaller package that covers the quantity at lower total cost ranks higher.\n\
         \n\
         Return the top {top_k_final} best substitutes. If fewer are suitable, return fewer. Do NOT pad with unsuitable products.",
        name = item.name,
        description = item.description,
        supercategory = item.supercategory,
        category = item.category,
        quantity = format_quantity(item.quantity),
        quantity_unit = item.quantity_unit,
        candidates_info = candidates_info,
        top_k_final = top_k_final,
    )
}

fn candidate_block(c: &Candidate) -> String {
    let mut lines = vec![
        format!("Product: {}", c.name),
        format!("Brand: {}", c.brand.as_deref().unwrap_or("N/A")),
        format!("Package: {}", c.uom_label()),
        format!("Price per package: ${:.2}", c.price),
    ];
    if !c.specs.is_empty() {
        let spec_str = c
            .specs
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        lines.push(format!("Specifications: {spec_str}"));
    }
    lines.join("\n")
}

/// Drops choices referencing unknown or duplicate SKUs, recomputes divisible
/// quantities locally, and truncates to `top_k_final`.
fn validate_choices(
    choices: Vec<RankedChoice>,
    item: &SourceItem,
    candidates: &[Candidate],
    top_k_final: usize,
) -> Vec<RankedChoice> {
    let by_sku: std::collections::HashMap<&str, &Candidate> =
        candidates.iter().map(|c| (c.sku.as_str(), c)).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut valid = Vec::new();

    for mut choice in choices {
        let Some(candidate) = by_sku.get(choice.sku.as_str()) else {
            warn!(sku = %choice.sku, "ranking referenced unknown sku, dropping");
            continue;
        };
        if !seen.insert(choice.sku.clone()) {
            warn!(sku = %choice.sku, "ranking repeated a sku, dropping duplicate");
            continue;
        }

        choice.qty_needed = match choice.unit_type {
            UnitType::Divisible if candidate.uom_qty > 0.0 => {
                ((item.quantity / candidate.uom_qty).ceil() as u32).max(1)
            }
            _ => choice.qty_needed.max(1),
        };

        valid.push(choice);
        if valid.len() == top_k_final {
            break;
        }
    }

    valid
}

/// Scripted ranking model for tests. Pops queued raw responses in order.
#[cfg(any(test, feature = "mock"))]
pub struct MockRankingModel {
    responses: parking_lot::Mutex<std::collections::VecDeque<String>>,
    calls: std::sync::atomic::AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "mock"))]
impl MockRankingModel {
    pub fn new() -> Self {
        Self {
            responses: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
            fail: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn push_response(&self, raw: impl Into<String>) {
        self.responses.lock().push_back(raw.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "mock"))]
impl Default for MockRankingModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl RankingModel for MockRankingModel {
    async fn rank(&self, _prompt: &str) -> Result<String, RankingError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(RankingError::ModelCall {
                message: "injected failure".to_string(),
            });
        }

        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| r#"{"substitutes":[]}"#.to_string()))
    }
}
