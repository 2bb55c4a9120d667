//! HTTP model gateway
//!
//! Talks to OpenAI-compatible chat-completion endpoints. Groq, Google and
//! Hugging Face all expose one, so a single request/response shape covers
//! every configured backend; only the base URL and credentials differ.
//!
//! Each backend gets its own [`CircuitBreaker`]. The council's health
//! filter (`is_healthy`) reflects the breaker, so a backend that keeps
//! failing drops out of selection until its reset timeout passes.

use crate::gateway::circuit::{CircuitBreaker, CircuitBreakerSettings};
use async_trait::async_trait;
use counsel_application::ports::model_gateway::{
    Completion, CompletionRequest, GatewayError, ModelGateway,
};
use counsel_domain::{BackendId, Provider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// One configured backend endpoint
#[derive(Debug, Clone)]
pub struct BackendEndpoint {
    pub id: BackendId,
    pub base_url: String,
    pub api_key: String,
}

impl BackendEndpoint {
    /// Default chat-completions base URL for a provider
    pub fn default_base_url(provider: Provider) -> &'static str {
        match provider {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::HuggingFace => "https://router.huggingface.co/v1",
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u32,
}

struct BackendSlot {
    endpoint: BackendEndpoint,
    breaker: CircuitBreaker,
}

/// Gateway over OpenAI-compatible HTTP backends
pub struct HttpModelGateway {
    client: reqwest::Client,
    order: Vec<BackendId>,
    slots: HashMap<String, BackendSlot>,
}

impl HttpModelGateway {
    pub fn new(
        endpoints: Vec<BackendEndpoint>,
        breaker_settings: CircuitBreakerSettings,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GatewayError::BackendUnavailable(e.to_string()))?;

        let order: Vec<BackendId> = endpoints.iter().map(|e| e.id.clone()).collect();
        let slots = endpoints
            .into_iter()
            .map(|endpoint| {
                let key = endpoint.id.key();
                let breaker = CircuitBreaker::new(key.clone(), breaker_settings.clone());
                (key, BackendSlot { endpoint, breaker })
            })
            .collect();

        Ok(Self {
            client,
            order,
            slots,
        })
    }

    fn slot(&self, backend: &BackendId) -> Result<&BackendSlot, GatewayError> {
        self.slots
            .get(&backend.key())
            .ok_or_else(|| GatewayError::BackendUnavailable(format!("unknown backend {backend}")))
    }

    async fn send(
        &self,
        slot: &BackendSlot,
        request: &CompletionRequest,
    ) -> Result<Completion, GatewayError> {
        let url = format!("{}/chat/completions", slot.endpoint.base_url);
        let body = ChatRequest {
            model: &slot.endpoint.id.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&slot.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else if e.is_connect() {
                    GatewayError::BackendUnavailable(e.to_string())
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 | 502 | 503 | 504 => {
                    GatewayError::BackendUnavailable(format!("{status}: {text}"))
                }
                _ => GatewayError::RequestFailed(format!("{status}: {text}")),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".to_string()))?;
        let tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

        Ok(Completion { content, tokens })
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    fn backends(&self) -> Vec<BackendId> {
        self.order.clone()
    }

    fn is_healthy(&self, backend: &BackendId) -> bool {
        self.slots
            .get(&backend.key())
            .is_some_and(|slot| slot.breaker.allow())
    }

    async fn complete(
        &self,
        backend: &BackendId,
        request: &CompletionRequest,
    ) -> Result<Completion, GatewayError> {
        let slot = self.slot(backend)?;
        if !slot.breaker.allow() {
            return Err(GatewayError::CircuitOpen(backend.key()));
        }

        debug!(backend = %backend, "Sending completion request");
        match self.send(slot, request).await {
            Ok(completion) => {
                slot.breaker.record_success();
                Ok(completion)
            }
            Err(e) => {
                // Every failure kind counts against the breaker, 4xx included
                warn!(backend = %backend, "Completion failed: {e}");
                slot.breaker.record_failure();
                Err(e)
            }
        }
    }
}
