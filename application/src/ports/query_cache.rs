//! Query Cache port
//!
//! Optional accelerator in front of the context provider. A miss is the
//! ordinary case; correctness never depends on the cache.

use async_trait::async_trait;
use std::time::Duration;

/// Cache for context-provider results, keyed by a hashed query projection
#[async_trait]
pub trait QueryCache: Send + Sync {
    /// Look up a cached result. `None` is a miss.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a result with a time-to-live.
    async fn set(&self, key: &str, value: String, ttl: Duration);
}
