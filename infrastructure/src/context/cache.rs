//! In-memory query cache with TTL
//!
//! Keys are SHA-256 digests of the normalized query, so semantically
//! identical queries (case, whitespace, jurisdiction order) share an
//! entry.

use async_trait::async_trait;
use counsel_application::ports::query_cache::QueryCache;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Hex SHA-256 of a normalized query string
pub fn cache_key(normalized: &str) -> String {
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{digest:x}")
}

#[derive(Default)]
pub struct InMemoryQueryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueryCache for InMemoryQueryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        // Opportunistic cleanup keeps the map from growing unbounded
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value, now + ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryQueryCache::new();
        cache.set("k", "v".to_string(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_gone() {
        let cache = InMemoryQueryCache::new();
        cache.set("k", "v".to_string(), Duration::from_millis(0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache = InMemoryQueryCache::new();
        assert!(cache.get("nothing").await.is_none());
    }

    #[test]
    fn test_cache_key_is_stable_and_distinct() {
        assert_eq!(cache_key("a|legal|5"), cache_key("a|legal|5"));
        assert_ne!(cache_key("a|legal|5"), cache_key("a|finance|5"));
    }
}
