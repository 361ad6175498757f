//! Substitution pipeline.
//!
//! Orchestrates the full request flow: validation, rate limiting, the two
//! cache levels, retrieval, ranking, local pricing math, and enrichment.
//! Pricing is never taken from the ranking model; spend and savings figures
//! are recomputed here from catalog prices captured at index time.

pub mod error;

pub use error::PipelineError;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::enrich::Enricher;
use crate::fingerprint::fingerprint;
use crate::model::{
    Candidate, RankedChoice, RankedSubstitute, SourceItem, SubstitutionResponse, round2,
};
use crate::ranking::Ranker;
use crate::ratelimit::{RateLimitDecision, RateLimiter};
use crate::retrieval::CandidateRetriever;

pub struct Pipeline {
    limiter: RateLimiter,
    result_cache: TtlCache<SubstitutionResponse>,
    candidate_cache: TtlCache<Vec<Candidate>>,
    retriever: CandidateRetriever,
    ranker: Ranker,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(
        limiter: RateLimiter,
        result_cache: TtlCache<SubstitutionResponse>,
        candidate_cache: TtlCache<Vec<Candidate>>,
        retriever: CandidateRetriever,
        ranker: Ranker,
        enricher: Enricher,
    ) -> Self {
        Self {
            limiter,
            result_cache,
            candidate_cache,
            retriever,
            ranker,
            enricher,
        }
    }

    /// Runs one substitution request for `identity`.
    pub async fn find_substitutes(
        &self,
        identity: &str,
        item: SourceItem,
    ) -> Result<SubstitutionResponse, PipelineError> {
        validate(&item)?;

        let remaining = match self.limiter.check_and_increment(identity) {
            RateLimitDecision::Denied => {
                return Err(PipelineError::RateLimited {
                    limit: self.limiter.limit(),
                });
            }
            RateLimitDecision::Allowed { remaining } => remaining,
        };

        let key = fingerprint(&item.name, &item.supercategory, &item.category);

        if let Some(mut cached) = self.result_cache.get(key) {
            debug!(key, "result cache hit");
            cached.requests_remaining = remaining;
            return Ok(cached);
        }

        let candidates = match self.candidate_cache.get(key) {
            Some(candidates) => {
                debug!(key, count = candidates.len(), "candidate cache hit");
                candidates
            }
            None => {
                let candidates = self.retriever.retrieve(&item).await?;
                self.candidate_cache.insert(key, candidates.clone());
                candidates
            }
        };

        if candidates.is_empty() {
            // Not cached: the next rebuild may populate this category.
            return Ok(SubstitutionResponse {
                message: Some(format!(
                    "No candidate products found in '{} > {}'.",
                    item.supercategory, item.category
                )),
                source_item: item,
                candidates_evaluated: 0,
                substitutes: Vec::new(),
                requests_remaining: remaining,
            });
        }

        let choices = self.ranker.rank(&item, &candidates).await?;
        let candidates_evaluated = candidates.len();

        if choices.is_empty() {
            // Terminal outcome; only ranked responses enter the result cache.
            return Ok(SubstitutionResponse {
                message: Some(
                    "No suitable substitutes identified among the retrieved candidates."
                        .to_string(),
                ),
                source_item: item,
                candidates_evaluated,
                substitutes: Vec::new(),
                requests_remaining: remaining,
            });
        }

        let ranked = compose_ranked(&item, choices, &candidates);
        let substitutes = self.enricher.enrich(ranked, &candidates).await;

        info!(
            key,
            candidates = candidates_evaluated,
            substitutes = substitutes.len(),
            "substitution completed"
        );

        let response = SubstitutionResponse {
            source_item: item,
            candidates_evaluated,
            message: None,
            substitutes,
            requests_remaining: remaining,
        };

        self.result_cache.insert(key, response.clone());
        Ok(response)
    }

    /// Allowance left for `identity`, without consuming a request.
    pub fn requests_remaining(&self, identity: &str) -> u32 {
        self.limiter.remaining(identity)
    }
}

fn validate(item: &SourceItem) -> Result<(), PipelineError> {
    let field_empty = |value: &str, field: &str| -> Result<(), PipelineError> {
        if value.trim().is_empty() {
            Err(PipelineError::Validation {
                message: format!("{field} must not be empty"),
            })
        } else {
            Ok(())
        }
    };

    field_empty(&item.name, "name")?;
    field_empty(&item.supercategory, "supercategory")?;
    field_empty(&item.category, "category")?;

    if !item.quantity.is_finite() || item.quantity <= 0.0 {
        return Err(PipelineError::Validation {
            message: "quantity must be a positive number".to_string(),
        });
    }

    Ok(())
}

/// Computes spend and savings locally and orders substitutes by ascending
/// total spend, reassigning ranks from 1.
fn compose_ranked(
    item: &SourceItem,
    choices: Vec<RankedChoice>,
    candidates: &[Candidate],
) -> Vec<RankedSubstitute> {
    let by_sku: HashMap<&str, &Candidate> =
        candidates.iter().map(|c| (c.sku.as_str(), c)).collect();

    let their_total = item.their_total_spend();
    let their_unit = item.their_unit_price();

    let mut ranked: Vec<RankedSubstitute> = choices
        .into_iter()
        .filter_map(|choice| {
            let candidate = by_sku.get(choice.sku.as_str())?;
            let our_total = round2(f64::from(choice.qty_needed) * candidate.price);

            let savings = their_total.map(|t| round2(t - our_total));
            let savings_percentage = their_total.and_then(|t| {
                if t > 0.0 {
                    savings.map(|s| round2(s / t * 100.0))
                } else {
                    None
                }
            });

            Some(RankedSubstitute {
                rank: choice.rank,
                sku: choice.sku,
                product_name: candidate.name.clone(),
                brand_name: candidate.brand.clone(),
                candidate_uom: candidate.uom_label(),
                unit_type: choice.unit_type,
                qty_needed: choice.qty_needed,
                our_unit_price: candidate.price,
                our_total_spend: our_total,
                their_unit_price: their_unit,
                their_total_spend: their_total,
                savings,
                savings_percentage,
                reason: choice.reason,
                comparison_notes: choice.comparison_notes,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.our_total_spend
            .partial_cmp(&b.our_total_spend)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, substitute) in ranked.iter_mut().enumerate() {
        substitute.rank = (i + 1) as u32;
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::UnitType;

    fn item(unit_price: Option<f64>, total_price: Option<f64>) -> SourceItem {
        SourceItem {
            name: "Copy Paper Letter Size".to_string(),
            description: String::new(),
            supercategory: "Office Supplies".to_string(),
            category: "Copy Paper".to_string(),
            quantity: 500.0,
            quantity_unit: "Sheets".to_string(),
            unit_price,
            total_price,
        }
    }

    fn candidate(sku: &str, uom_qty: f64, price: f64) -> Candidate {
        Candidate {
            sku: sku.to_string(),
            name: format!("Paper {sku}"),
            brand: Some("TruRed".to_string()),
            uom: "Sheets".to_string(),
            uom_qty,
            price,
            specs: Vec::new(),
            score: 0.9,
        }
    }

    fn choice(sku: &str, qty_needed: u32) -> RankedChoice {
        RankedChoice {
            sku: sku.to_string(),
            rank: 1,
            reason: "match".to_string(),
            unit_type: UnitType::Divisible,
            qty_needed,
            comparison_notes: "n/a".to_string(),
        }
    }

    #[test]
    fn test_compose_computes_savings_against_unit_price() {
        let candidates = vec![candidate("P1", 500.0, 9.49)];
        let ranked = compose_ranked(
            &item(Some(12.99), None),
            vec![choice("P1", 1)],
            &candidates,
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].our_total_spend, 9.49);
        assert_eq!(ranked[0].their_total_spend, Some(12.99));
        assert_eq!(ranked[0].savings, Some(3.50));
        assert_eq!(ranked[0].savings_percentage, Some(26.94));
    }

    #[test]
    fn test_compose_total_price_overrides_unit_price() {
        let candidates = vec![candidate("P1", 500.0, 9.49)];
        let ranked = compose_ranked(
            &item(Some(12.99), Some(25.98)),
            vec![choice("P1", 1)],
            &candidates,
        );

        assert_eq!(ranked[0].their_total_spend, Some(25.98));
        assert_eq!(ranked[0].savings, Some(16.49));
    }

    #[test]
    fn test_compose_suppresses_savings_without_competitor_price() {
        let candidates = vec![candidate("P1", 500.0, 9.49)];
        let ranked = compose_ranked(&item(None, None), vec![choice("P1", 1)], &candidates);

        assert_eq!(ranked[0].our_total_spend, 9.49);
        assert_eq!(ranked[0].their_total_spend, None);
        assert_eq!(ranked[0].savings, None);
        assert_eq!(ranked[0].savings_percentage, None);
    }

    #[test]
    fn test_compose_negative_savings_preserved() {
        let candidates = vec![candidate("P1", 500.0, 15.00)];
        let ranked = compose_ranked(
            &item(Some(12.99), None),
            vec![choice("P1", 1)],
            &candidates,
        );

        assert_eq!(ranked[0].savings, Some(-2.01));
    }

    #[test]
    fn test_compose_orders_by_total_spend_and_reranks() {
        let candidates = vec![
            candidate("EXPENSIVE", 500.0, 20.00),
            candidate("CHEAP", 5000.0, 30.00),
            candidate("MID", 500.0, 9.49),
        ];
        // CHEAP covers 500 sheets in one 5000-sheet case but costs more total;
        // total spend decides, not package economics.
        let choices = vec![
            choice("EXPENSIVE", 1),
            choice("CHEAP", 1),
            choice("MID", 1),
        ];

        let ranked = compose_ranked(&item(Some(12.99), None), choices, &candidates);

        let order: Vec<&str> = ranked.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(order, vec!["MID", "EXPENSIVE", "CHEAP"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_compose_total_spend_uses_qty_needed() {
        let candidates = vec![candidate("P1", 500.0, 9.49)];
        let ranked = compose_ranked(
            &item(Some(60.0), None),
            vec![choice("P1", 4)],
            &candidates,
        );

        assert_eq!(ranked[0].our_total_spend, 37.96);
        assert_eq!(ranked[0].savings, Some(22.04));
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        let mut bad = item(None, None);
        bad.name = "  ".to_string();
        assert!(matches!(
            validate(&bad),
            Err(PipelineError::Validation { .. })
        ));

        let mut bad = item(None, None);
        bad.category = String::new();
        assert!(validate(&bad).is_err());

        let mut bad = item(None, None);
        bad.quantity = 0.0;
        assert!(validate(&bad).is_err());

        let mut bad = item(None, None);
        bad.quantity = f64::NAN;
        assert!(validate(&bad).is_err());

        assert!(validate(&item(None, None)).is_ok());
    }
}
