//! Task queue configuration from TOML (`[queue]` section)
//!
//! ```toml
//! [queue]
//! workers = 4
//! task_timeout_secs = 300
//! max_attempts = 3
//! retry_base_delay_ms = 1000
//! retry_max_delay_ms = 30000
//! retry_jitter = 0.3
//! ```

use counsel_application::{QueueConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQueueConfig {
    pub workers: usize,
    pub task_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter: f64,
}

impl Default for FileQueueConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            task_timeout_secs: 300,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 30_000,
            retry_jitter: 0.3,
        }
    }
}

impl FileQueueConfig {
    pub fn to_config(&self) -> QueueConfig {
        QueueConfig {
            workers: self.workers,
            task_timeout: Duration::from_secs(self.task_timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
                max_delay: Duration::from_millis(self.retry_max_delay_ms),
                jitter: self.retry_jitter.clamp(0.0, 1.0),
            },
            ..QueueConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_is_clamped() {
        let config = FileQueueConfig {
            retry_jitter: 7.5,
            ..Default::default()
        };
        assert_eq!(config.to_config().retry.jitter, 1.0);
    }
}
