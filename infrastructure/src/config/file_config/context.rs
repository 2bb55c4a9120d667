//! Context retrieval configuration from TOML (`[context]` section)
//!
//! ```toml
//! [context]
//! endpoint = "https://retrieval.internal/api/search"
//! research_endpoint = "https://research.internal/api/search"
//! timeout_secs = 10
//! cache_ttl_secs = 900
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContextConfig {
    /// Retrieval endpoint; context is disabled when absent
    pub endpoint: Option<String>,
    /// Live research endpoint used for the competitor domain
    pub research_endpoint: Option<String>,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for FileContextConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            research_endpoint: None,
            timeout_secs: 10,
            cache_ttl_secs: 900,
        }
    }
}

impl FileContextConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
