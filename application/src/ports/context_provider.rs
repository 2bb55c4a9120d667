//! Context Provider port
//!
//! Supplies supporting context for a draft prompt. Absence of context is
//! normal operation, never an error: implementations return an empty
//! string when they have nothing, and callers proceed without it.

use async_trait::async_trait;
use counsel_domain::AgentDomain;

/// Query parameters for context retrieval
#[derive(Debug, Clone)]
pub struct ContextQuery {
    pub query: String,
    pub domain: AgentDomain,
    pub sector: Option<String>,
    pub region: Option<String>,
    pub jurisdictions: Vec<String>,
    /// Maximum number of context passages to retrieve
    pub limit: usize,
}

impl ContextQuery {
    pub fn new(query: impl Into<String>, domain: AgentDomain) -> Self {
        Self {
            query: query.into(),
            domain,
            sector: None,
            region: None,
            jurisdictions: Vec::new(),
            limit: 5,
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdictions.push(jurisdiction.into());
        self
    }

    /// Stable projection of the query used as a cache key input
    pub fn normalized(&self) -> String {
        let mut jurisdictions = self.jurisdictions.clone();
        jurisdictions.sort();
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.query.trim().to_lowercase(),
            self.domain,
            self.sector.as_deref().unwrap_or("").to_lowercase(),
            self.region.as_deref().unwrap_or("").to_lowercase(),
            jurisdictions.join(",").to_lowercase(),
            self.limit,
        )
    }
}

/// Supplies supporting context for draft generation
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Retrieve context for the query. Empty string means "proceed without
    /// context"; implementations must not surface retrieval failures as
    /// errors.
    async fn get_context(&self, query: &ContextQuery) -> String;
}

/// Provider that always returns no context
pub struct NoContext;

#[async_trait]
impl ContextProvider for NoContext {
    async fn get_context(&self, _query: &ContextQuery) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_is_order_insensitive_for_jurisdictions() {
        let a = ContextQuery::new("SAFE cap?", AgentDomain::Legal)
            .with_jurisdiction("US-DE")
            .with_jurisdiction("UK");
        let b = ContextQuery::new("SAFE cap?", AgentDomain::Legal)
            .with_jurisdiction("UK")
            .with_jurisdiction("US-DE");
        assert_eq!(a.normalized(), b.normalized());
    }

    #[test]
    fn test_normalized_trims_and_lowercases() {
        let a = ContextQuery::new("  What Is Runway ", AgentDomain::Finance);
        let b = ContextQuery::new("what is runway", AgentDomain::Finance);
        assert_eq!(a.normalized(), b.normalized());
    }

    #[tokio::test]
    async fn test_no_context_returns_empty() {
        let query = ContextQuery::new("anything", AgentDomain::Investor);
        assert_eq!(NoContext.get_context(&query).await, "");
    }
}
