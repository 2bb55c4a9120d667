//! Live research context provider
//!
//! Queries a search/research endpoint for current results rather than a
//! curated corpus. Used for domains where the answer depends on what the
//! outside world looks like today (competitive landscapes). Same failure
//! contract as retrieval: any error degrades to empty context.

use async_trait::async_trait;
use counsel_application::ports::context_provider::{ContextProvider, ContextQuery};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct ResearchRequest<'a> {
    query: &'a str,
    domain: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sector: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    limit: usize,
}

#[derive(Deserialize)]
struct ResearchResponse {
    #[serde(default)]
    results: Vec<ResearchResult>,
}

#[derive(Deserialize)]
struct ResearchResult {
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

/// Live research over an HTTP endpoint returning `{"results": [...]}`
pub struct HttpResearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpResearchProvider {
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

    async fn fetch(&self, query: &ContextQuery) -> Result<Vec<ResearchResult>, reqwest::Error> {
        let body = ResearchRequest {
            query: &query.query,
            domain: query.domain.as_str(),
            sector: query.sector.as_deref(),
            region: query.region.as_deref(),
            limit: query.limit,
        };
        let response: ResearchResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.results)
    }
}

fn render_results(results: &[ResearchResult]) -> String {
    let mut out = String::new();
    for result in results {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&result.title);
        if !result.snippet.is_empty() {
            out.push('\n');
            out.push_str(&result.snippet);
        }
        if !result.url.is_empty() {
            out.push_str("\nSource: ");
            out.push_str(&result.url);
        }
    }
    out
}

#[async_trait]
impl ContextProvider for HttpResearchProvider {
    async fn get_context(&self, query: &ContextQuery) -> String {
        match self.fetch(query).await {
            Ok(results) => {
                debug!(
                    domain = %query.domain,
                    count = results.len(),
                    "Research results retrieved"
                );
                render_results(&results)
            }
            Err(e) => {
                warn!("Research lookup failed, proceeding without: {e}");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::AgentDomain;

    fn result(title: &str, url: &str, snippet: &str) -> ResearchResult {
        ResearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_render_joins_results_with_sources() {
        let rendered = render_results(&[
            result("Rival raises Series B", "https://news.example/a", "Raised $30M."),
            result("Pricing page update", "", "Moved to usage-based pricing."),
        ]);

        assert!(rendered.contains("Rival raises Series B"));
        assert!(rendered.contains("Source: https://news.example/a"));
        assert!(rendered.contains("usage-based pricing"));
        // No trailing source line for the result without a url
        assert!(!rendered.ends_with("Source: "));
    }

    #[test]
    fn test_render_empty_results() {
        assert_eq!(render_results(&[]), "");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_to_empty() {
        let provider =
            HttpResearchProvider::new("http://127.0.0.1:1/search", Duration::from_millis(200));
        let query = ContextQuery::new("competitor landscape", AgentDomain::Competitor);
        assert_eq!(provider.get_context(&query).await, "");
    }
}
