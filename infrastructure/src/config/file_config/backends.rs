//! Backend endpoint configuration from TOML (`[backends]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [[backends.backend]]
//! provider = "groq"
//! model = "llama-3.3-70b-versatile"
//! name = "llama-70b"
//! api_key_env = "GROQ_API_KEY"
//!
//! [[backends.backend]]
//! provider = "google"
//! model = "gemini-2.0-flash"
//! name = "gemini-flash"
//! ```

use crate::gateway::http::BackendEndpoint;
use counsel_domain::{BackendId, Provider};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One backend entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackendConfig {
    /// Provider name: "groq", "google", "huggingface" (or "hf")
    pub provider: String,
    /// Provider-side model identifier
    pub model: String,
    /// Display name; defaults to the model identifier
    pub name: Option<String>,
    /// Environment variable holding the API key; defaults per provider
    pub api_key_env: Option<String>,
    /// Override for the chat-completions base URL
    pub base_url: Option<String>,
}

impl FileBackendConfig {
    fn default_api_key_env(provider: Provider) -> &'static str {
        match provider {
            Provider::Groq => "GROQ_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
            Provider::HuggingFace => "HF_API_KEY",
        }
    }

    /// Resolve into a gateway endpoint, reading the API key from the
    /// environment. Entries with an unknown provider or a missing key are
    /// skipped with a warning.
    pub fn resolve(&self) -> Option<BackendEndpoint> {
        let provider: Provider = match self.provider.parse() {
            Ok(p) => p,
            Err(_) => {
                warn!("Skipping backend '{}': unknown provider '{}'", self.model, self.provider);
                return None;
            }
        };
        let key_env = self
            .api_key_env
            .as_deref()
            .unwrap_or_else(|| Self::default_api_key_env(provider));
        let api_key = match std::env::var(key_env) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                warn!("Skipping backend '{}': {key_env} is not set", self.model);
                return None;
            }
        };

        let name = self.name.clone().unwrap_or_else(|| self.model.clone());
        Some(BackendEndpoint {
            id: BackendId::new(provider, &self.model, name),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| BackendEndpoint::default_base_url(provider).to_string()),
            api_key,
        })
    }
}

/// Backend list configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendsConfig {
    pub backend: Vec<FileBackendConfig>,
}

impl FileBackendsConfig {
    /// The configured backend identities (without resolving credentials)
    pub fn parsed(&self) -> Vec<BackendId> {
        self.backend
            .iter()
            .filter_map(|b| {
                b.provider.parse::<Provider>().ok().map(|provider| {
                    BackendId::new(
                        provider,
                        &b.model,
                        b.name.clone().unwrap_or_else(|| b.model.clone()),
                    )
                })
            })
            .collect()
    }

    /// Resolve every entry that has usable credentials
    pub fn resolve(&self) -> Vec<BackendEndpoint> {
        self.backend.iter().filter_map(|b| b.resolve()).collect()
    }
}
