//! Model Gateway port
//!
//! Uniform interface to N independently failing text-generation backends.
//! Every error here is per-backend: the council recovers by dropping the
//! participant, so nothing in this module is fatal on its own.

use async_trait::async_trait;
use counsel_domain::BackendId;
use thiserror::Error;

/// Errors from a single backend call
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Circuit open for backend {0}")]
    CircuitOpen(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether a retry at the queue level could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::BackendUnavailable(_)
                | GatewayError::Timeout
                | GatewayError::CircuitOpen(_)
        )
    }
}

/// One chat-completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// One completed backend response
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    /// Total tokens the call consumed (prompt + completion); 0 when the
    /// backend does not report usage.
    pub tokens: u32,
}

/// Gateway for model backend communication
///
/// Implementations own per-backend health tracking (circuit breaking);
/// `is_healthy` is the council's selection filter.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Backends configured for council participation, in configured order
    fn backends(&self) -> Vec<BackendId>;

    /// Whether the backend is currently accepting calls
    fn is_healthy(&self, backend: &BackendId) -> bool;

    /// Issue one completion request to one backend
    async fn complete(
        &self,
        backend: &BackendId,
        request: &CompletionRequest,
    ) -> Result<Completion, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Timeout.is_transient());
        assert!(GatewayError::BackendUnavailable("503".into()).is_transient());
        assert!(GatewayError::CircuitOpen("groq/x".into()).is_transient());
        assert!(!GatewayError::InvalidResponse("bad json".into()).is_transient());
    }

    #[test]
    fn test_request_builder_defaults() {
        let req = CompletionRequest::new("sys", "user");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, 2048);

        let req = req.with_temperature(0.2).with_max_tokens(512);
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.max_tokens, 512);
    }
}
