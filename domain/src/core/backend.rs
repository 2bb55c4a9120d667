//! Backend value objects identifying an external model backend

use serde::{Deserialize, Serialize};

/// Provider family hosting a model backend (Value Object)
///
/// The council deliberately spans several independently operated providers
/// so that a single provider outage cannot take the whole council down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    Google,
    HuggingFace,
}

impl Provider {
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Groq => "groq",
            Provider::Google => "google",
            Provider::HuggingFace => "huggingface",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "google" => Ok(Provider::Google),
            "huggingface" | "hf" => Ok(Provider::HuggingFace),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Identifies one model backend the council can call (Value Object)
///
/// `model` is the provider-side model slug; `name` is a human-readable
/// label used in logs and run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendId {
    pub provider: Provider,
    pub model: String,
    pub name: String,
}

impl BackendId {
    pub fn new(provider: Provider, model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            name: name.into(),
        }
    }

    /// Stable key for breaker state, log fields, and run metadata
    pub fn key(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        for p in [Provider::Groq, Provider::Google, Provider::HuggingFace] {
            let parsed: Provider = p.as_str().parse().unwrap();
            assert_eq!(parsed, p);
        }
    }

    #[test]
    fn test_provider_hf_alias() {
        let parsed: Provider = "hf".parse().unwrap();
        assert_eq!(parsed, Provider::HuggingFace);
    }

    #[test]
    fn test_backend_key() {
        let backend = BackendId::new(Provider::Groq, "llama-3.3-70b-versatile", "Llama 3.3 70B");
        assert_eq!(backend.key(), "groq/llama-3.3-70b-versatile");
        assert_eq!(backend.to_string(), "Llama 3.3 70B");
    }
}
