//! Product substitution service.
//!
//! Given a competitor's product, finds equivalent items from our own catalog
//! and ranks them by total spend. The flow per request:
//!
//! 1. Validate and rate-limit by client identity.
//! 2. Check the ranked-response cache, then the candidate cache.
//! 3. On a full miss, embed the request text and search the active index
//!    generation, hard-filtered to the request's category pair.
//! 4. Ask the ranking model which candidates qualify and how many packages
//!    cover the requested quantity; recompute every number it returns.
//! 5. Price locally, order by ascending total spend, enrich from the catalog.
//!
//! The vector index is rebuilt blue-green: each rebuild populates a fresh
//! collection and swaps an atomic pointer only once fully populated, so
//! searches never observe a half-built index.

pub mod cache;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod enrich;
pub mod fingerprint;
pub mod gateway;
pub mod index;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod ratelimit;
pub mod retrieval;
pub mod store;
pub mod vectordb;

pub use cache::TtlCache;
pub use config::Config;
pub use enrich::Enricher;
pub use gateway::{AppState, create_router};
pub use index::{GenerationRegistry, IndexReport, Indexer};
pub use pipeline::{Pipeline, PipelineError};
pub use ranking::{GenaiRankingModel, Ranker, RankingModel};
pub use ratelimit::{RateLimitDecision, RateLimiter};
pub use retrieval::CandidateRetriever;
