//! Context retrieval providers
//!
//! [`HttpContextProvider`] queries a retrieval endpoint for supporting
//! passages. Per the port contract, every failure degrades to "no
//! context": the pipeline proceeds and the incident is logged.
//!
//! [`CachedContextProvider`] wraps any provider with the query cache,
//! keyed by the normalized query digest.

use crate::context::cache::cache_key;
use async_trait::async_trait;
use counsel_application::ports::context_provider::{ContextProvider, ContextQuery};
use counsel_application::ports::query_cache::QueryCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct RetrievalRequest<'a> {
    query: &'a str,
    domain: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sector: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    jurisdictions: Vec<&'a str>,
    limit: usize,
}

#[derive(Deserialize)]
struct RetrievalResponse {
    #[serde(default)]
    passages: Vec<String>,
}

/// Retrieval over an HTTP endpoint returning `{"passages": [...]}`
pub struct HttpContextProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContextProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn fetch(&self, query: &ContextQuery) -> Result<Vec<String>, reqwest::Error> {
        let body = RetrievalRequest {
            query: &query.query,
            domain: query.domain.as_str(),
            sector: query.sector.as_deref(),
            region: query.region.as_deref(),
            jurisdictions: query.jurisdictions.iter().map(String::as_str).collect(),
            limit: query.limit,
        };
        let response: RetrievalResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.passages)
    }
}

#[async_trait]
impl ContextProvider for HttpContextProvider {
    async fn get_context(&self, query: &ContextQuery) -> String {
        match self.fetch(query).await {
            Ok(passages) => {
                debug!(
                    domain = %query.domain,
                    count = passages.len(),
                    "Context retrieved"
                );
                passages.join("\n\n")
            }
            Err(e) => {
                warn!("Context retrieval failed, proceeding without: {e}");
                String::new()
            }
        }
    }
}

/// Cache layer over any context provider
pub struct CachedContextProvider {
    inner: Arc<dyn ContextProvider>,
    cache: Arc<dyn QueryCache>,
    ttl: Duration,
}

impl CachedContextProvider {
    pub fn new(inner: Arc<dyn ContextProvider>, cache: Arc<dyn QueryCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl ContextProvider for CachedContextProvider {
    async fn get_context(&self, query: &ContextQuery) -> String {
        let key = cache_key(&query.normalized());
        if let Some(hit) = self.cache.get(&key).await {
            debug!("Context cache hit");
            return hit;
        }

        let context = self.inner.get_context(query).await;
        // Empty results are cached too: a provider with nothing to say
        // will have nothing to say again in a moment
        self.cache.set(&key, context.clone(), self.ttl).await;
        context
    }
}
