//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the settings types
//! the application layer consumes.

mod backends;
mod context;
mod council;
mod guard;
mod queue;
mod store;
mod streaming;

pub use backends::{FileBackendConfig, FileBackendsConfig};
pub use context::FileContextConfig;
pub use council::FileCouncilConfig;
pub use guard::FileGuardConfig;
pub use queue::FileQueueConfig;
pub use store::FileStoreConfig;
pub use streaming::FileStreamingConfig;

use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model backend endpoints
    pub backends: FileBackendsConfig,
    /// Council protocol settings
    pub council: FileCouncilConfig,
    /// Task queue settings
    pub queue: FileQueueConfig,
    /// Progress streaming settings
    pub streaming: FileStreamingConfig,
    /// Context retrieval settings
    pub context: FileContextConfig,
    /// PII guard settings
    pub guard: FileGuardConfig,
    /// Task persistence settings
    pub store: FileStoreConfig,
}

impl FileConfig {
    /// Validate cross-section constraints, returning human-readable
    /// problems. An empty list means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.council.min_models == 0 {
            problems.push("council.min_models must be at least 1".to_string());
        }
        if self.council.max_models < self.council.min_models {
            problems.push(format!(
                "council.max_models ({}) is below council.min_models ({})",
                self.council.max_models, self.council.min_models
            ));
        }
        if self.backends.parsed().len() < self.council.min_models {
            problems.push(format!(
                "{} backend(s) configured but council.min_models is {}",
                self.backends.parsed().len(),
                self.council.min_models
            ));
        }
        if self.queue.workers == 0 {
            problems.push("queue.workers must be at least 1".to_string());
        }
        if self.queue.max_attempts == 0 {
            problems.push("queue.max_attempts must be at least 1".to_string());
        }
        if self.streaming.buffer_capacity == 0 {
            problems.push("streaming.buffer_capacity must be at least 1".to_string());
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[[backends.backend]]
provider = "groq"
model = "llama-3.3-70b-versatile"
name = "llama-70b"

[[backends.backend]]
provider = "google"
model = "gemini-2.0-flash"
name = "gemini-flash"

[council]
min_models = 2
max_models = 4
temperature = 0.5

[queue]
workers = 8
max_attempts = 2

[streaming]
buffer_capacity = 50
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backends.backend.len(), 2);
        assert_eq!(config.council.min_models, 2);
        assert_eq!(config.council.max_models, 4);
        assert_eq!(config.queue.workers, 8);
        assert_eq!(config.streaming.buffer_capacity, 50);
        // Untouched sections keep their defaults
        assert_eq!(config.queue.task_timeout_secs, 300);
        assert!(config.guard.enabled);
    }

    #[test]
    fn test_default_config_fails_backend_minimum() {
        let config = FileConfig::default();
        let problems = config.validate();
        assert!(problems.iter().any(|p| p.contains("backend(s) configured")));
    }

    #[test]
    fn test_validate_flags_inverted_model_bounds() {
        let mut config = FileConfig::default();
        config.council.min_models = 4;
        config.council.max_models = 2;
        let problems = config.validate();
        assert!(problems.iter().any(|p| p.contains("max_models")));
    }
}
