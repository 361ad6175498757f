//! Keyed TTL cache used at two pipeline levels.
//!
//! Two independently configured instances sit in front of retrieval (candidate
//! sets) and ranking (full responses). Expiry is lazy: an entry older than the
//! TTL is treated as absent on read and evicted then. `moka` provides the
//! concurrent map, so readers never observe a torn write; last-write-wins races
//! on the same key are acceptable and idempotent for identical payloads.
//!
//! There is deliberately no LRU/size pressure beyond a generous capacity bound:
//! the keyspace is distinct (product, category) fingerprints, assumed to fit in
//! memory. A multi-instance deployment would need an external cache store.

use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::constants::DEFAULT_CACHE_CAPACITY;

/// A cached value and its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// In-memory cache keyed by request fingerprint, with lazy TTL expiry.
///
/// A TTL of zero disables the instance entirely: every `get` is a forced miss
/// and `insert` is a no-op.
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    entries: Cache<u64, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Creates a cache with the default capacity.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY, ttl)
    }

    /// Creates a cache with a max entry capacity.
    pub fn with_capacity(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            ttl,
        }
    }

    /// Looks up a fingerprint, treating entries older than the TTL as absent.
    pub fn get(&self, key: u64) -> Option<V> {
        if self.ttl.is_zero() {
            return None;
        }
        let entry = self.entries.get(&key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            self.entries.invalidate(&key);
            return None;
        }
        Some(entry.value)
    }

    /// Stores a value under a fingerprint. No-op when the TTL is zero.
    pub fn insert(&self, key: u64, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live entries (including not-yet-expired ones).
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl<V: Clone + Send + Sync + 'static> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}
