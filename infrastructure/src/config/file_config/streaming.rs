//! Streaming configuration from TOML (`[streaming]` section)
//!
//! ```toml
//! [streaming]
//! buffer_capacity = 100
//! buffer_ttl_secs = 3600
//! lock_ttl_ms = 2000
//! lock_attempts = 10
//! lock_retry_delay_ms = 50
//! ```

use crate::streaming::BufferSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStreamingConfig {
    pub buffer_capacity: usize,
    pub buffer_ttl_secs: u64,
    pub lock_ttl_ms: u64,
    pub lock_attempts: u32,
    pub lock_retry_delay_ms: u64,
}

impl Default for FileStreamingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 100,
            buffer_ttl_secs: 3600,
            lock_ttl_ms: 2000,
            lock_attempts: 10,
            lock_retry_delay_ms: 50,
        }
    }
}

impl FileStreamingConfig {
    pub fn to_settings(&self) -> BufferSettings {
        BufferSettings {
            capacity: self.buffer_capacity,
            ttl: Duration::from_secs(self.buffer_ttl_secs),
            lock_ttl: Duration::from_millis(self.lock_ttl_ms),
            lock_attempts: self.lock_attempts,
            lock_retry_delay: Duration::from_millis(self.lock_retry_delay_ms),
        }
    }
}
