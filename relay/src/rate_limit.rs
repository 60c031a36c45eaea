// Per-client request ceiling. Each client gets a counter that lives for one
// window, starting at its first request; once the entry expires the next
// request starts a fresh window.
use moka::sync::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::RateLimitConfig;
use crate::metrics_defs::RATE_LIMITED;
use shared::counter;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

// Upper bound on tracked clients. Evicting a client early only resets its window.
const MAX_TRACKED_CLIENTS: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u64 },
    Limited,
}

pub struct RateLimiter {
    max_requests: u64,
    hits: Cache<String, Arc<AtomicU64>>,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        let hits = Cache::builder()
            .max_capacity(MAX_TRACKED_CLIENTS)
            .time_to_live(window)
            .build();

        RateLimiter { max_requests, hits }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Count one request for `client` and decide whether it may proceed.
    pub fn check(&self, client: &str) -> RateLimitDecision {
        let counter = self
            .hits
            .get_with_by_ref(client, || Arc::new(AtomicU64::new(0)));
        let count = counter.fetch_add(1, Ordering::AcqRel) + 1;

        if count > self.max_requests {
            counter!(RATE_LIMITED).increment(1);
            RateLimitDecision::Limited
        } else {
            RateLimitDecision::Allowed {
                remaining: self.max_requests - count,
            }
        }
    }
}
