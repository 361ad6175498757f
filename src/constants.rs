//! Cross-cutting, shared defaults.
//!
//! Prefer deriving runtime values from [`crate::config::Config`]; these constants
//! are the fallbacks the config layer starts from.

/// Candidates fetched from the vector index per request.
pub const DEFAULT_TOP_K_VECTOR: u64 = 20;

/// Substitutes returned to the client (and requested from the ranking model).
pub const DEFAULT_TOP_K_FINAL: usize = 5;

/// Upper bound on specification pairs carried by a slim candidate.
///
/// Candidates are deliberately kept slim (no description, no marketing bullets)
/// so the ranking prompt stays bounded regardless of catalog verbosity.
pub const SLIM_SPEC_LIMIT: usize = 8;

/// Products embedded and upserted per batch during reindexing.
pub const INDEX_BATCH_SIZE: usize = 100;

/// Default TTL for the fully ranked + enriched response cache.
pub const DEFAULT_RESULT_TTL_SECS: u64 = 3_600;

/// Default TTL for the retrieved-candidate cache.
pub const DEFAULT_CANDIDATE_TTL_SECS: u64 = 1_800;

/// Max entries per cache instance (distinct product/category fingerprints).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Requests allowed per client identity for the process lifetime.
pub const DEFAULT_RATE_LIMIT: u32 = 25;

/// Per-call timeout applied to every external collaborator (vector search,
/// ranking model, relational queries).
pub const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 30;

/// Embedding vector dimension of the default embedding model.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Default ranking model identifier passed to the AI collaborator.
pub const DEFAULT_RANK_MODEL: &str = "gemini-2.5-flash";

/// Default embedding model requested from the embeddings endpoint.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";

/// Prefix for blue-green index generation collection names.
pub const GENERATION_PREFIX: &str = "products_";
