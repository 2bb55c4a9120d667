//! Council protocol configuration from TOML (`[council]` section)
//!
//! ```toml
//! [council]
//! min_models = 2
//! max_models = 5
//! temperature = 0.7
//! max_tokens = 2048
//! per_call_timeout_secs = 45
//! ```

use counsel_application::CouncilSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Minimum surviving participants for a valid run
    pub min_models: usize,
    /// Maximum backends selected into a run
    pub max_models: usize,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Per-backend-call timeout in seconds
    pub per_call_timeout_secs: u64,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            min_models: 2,
            max_models: 5,
            temperature: 0.7,
            max_tokens: 2048,
            per_call_timeout_secs: 45,
        }
    }
}

impl FileCouncilConfig {
    pub fn to_settings(&self) -> CouncilSettings {
        CouncilSettings {
            min_models: self.min_models,
            max_models: self.max_models,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            per_call_timeout: Duration::from_secs(self.per_call_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_settings_defaults() {
        let settings = FileCouncilConfig::default().to_settings();
        assert_eq!(settings.min_models, 2);
        assert_eq!(settings.max_models, 5);
        assert_eq!(settings.per_call_timeout, Duration::from_secs(45));
    }
}
