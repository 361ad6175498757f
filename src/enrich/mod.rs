//! Response enrichment.
//!
//! Attaches marketing bullets and full specification maps to ranked
//! substitutes with exactly two bulk catalog lookups, regardless of how many
//! substitutes were ranked. Enrichment is non-fatal: if the catalog is
//! unreachable the ranked results still go out, with empty detail maps.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::model::{Candidate, EnrichedSubstitute, RankedSubstitute};
use crate::store::ProductStore;

pub struct Enricher {
    store: Arc<dyn ProductStore>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(store: Arc<dyn ProductStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Enriches ranked substitutes with catalog details.
    pub async fn enrich(
        &self,
        substitutes: Vec<RankedSubstitute>,
        candidates: &[Candidate],
    ) -> Vec<EnrichedSubstitute> {
        if substitutes.is_empty() {
            return Vec::new();
        }

        let skus: Vec<String> = substitutes.iter().map(|s| s.sku.clone()).collect();

        let lookups = tokio::time::timeout(self.timeout, async {
            tokio::try_join!(
                self.store.bullets_by_skus(&skus),
                self.store.specs_by_skus(&skus)
            )
        })
        .await;

        let (mut bullets, mut specs) = match lookups {
            Ok(Ok(maps)) => maps,
            Ok(Err(err)) => {
                warn!(error = %err, "enrichment lookups failed, returning bare substitutes");
                (HashMap::new(), HashMap::new())
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "enrichment lookups timed out, returning bare substitutes"
                );
                (HashMap::new(), HashMap::new())
            }
        };

        let by_sku: HashMap<&str, &Candidate> =
            candidates.iter().map(|c| (c.sku.as_str(), c)).collect();

        substitutes
            .into_iter()
            .map(|substitute| {
                let details = by_sku
                    .get(substitute.sku.as_str())
                    .map(|c| product_details(c))
                    .unwrap_or_default();

                EnrichedSubstitute {
                    bullets: bullets.remove(&substitute.sku).unwrap_or_default(),
                    specs: specs.remove(&substitute.sku).unwrap_or_default(),
                    product_details: details,
                    substitute,
                }
            })
            .collect()
    }
}

/// Descriptive attributes carried on the candidate since index time.
fn product_details(candidate: &Candidate) -> BTreeMap<String, serde_json::Value> {
    let mut details = BTreeMap::new();
    details.insert("name".to_string(), candidate.name.clone().into());
    if let Some(brand) = &candidate.brand {
        details.insert("brand_name".to_string(), brand.clone().into());
    }
    details.insert("uom".to_string(), candidate.uom.clone().into());
    details.insert("uom_qty".to_string(), candidate.uom_qty.into());
    details.insert("price".to_string(), candidate.price.into());
    details
}
