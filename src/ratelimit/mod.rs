//! Per-client request ceiling.
//!
//! Counts are monotonic for the process lifetime: no decay, no refunds on
//! error paths deeper in the pipeline, reset only by restart. A single mutex
//! over the counter map makes concurrent increments for the same identity
//! linearizable; contention is negligible at the request rates this serves.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request may proceed; `remaining` is the allowance left after it.
    Allowed { remaining: u32 },
    /// The ceiling has been reached for this identity.
    Denied,
}

/// In-process request counter keyed by client identity (e.g. source IP).
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    counts: Mutex<HashMap<String, u32>>,
}

impl RateLimiter {
    /// Creates a limiter with a hard per-identity ceiling.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Configured ceiling.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records one request for `identity` and reports whether it may proceed.
    ///
    /// The counter is incremented even on the call that trips the limit; a
    /// consumed slot is never refunded.
    pub fn check_and_increment(&self, identity: &str) -> RateLimitDecision {
        let mut counts = self.counts.lock();
        let count = counts.entry(identity.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        if *count > self.limit {
            RateLimitDecision::Denied
        } else {
            RateLimitDecision::Allowed {
                remaining: self.limit - *count,
            }
        }
    }

    /// Current allowance left for `identity`, without consuming a slot.
    pub fn remaining(&self, identity: &str) -> u32 {
        let counts = self.counts.lock();
        self.limit
            .saturating_sub(counts.get(identity).copied().unwrap_or(0))
    }
}
