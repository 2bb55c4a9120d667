//! Advisory agents
//!
//! One agent per advisory domain, all backed by the same council engine
//! and differing only in system prompt and context retrieval. Agents are
//! held in a flat registry keyed by [`AgentDomain`]; there is no agent
//! hierarchy.
//!
//! Phases map onto the council protocol like this:
//! - `draft` runs a full council round on the advisor's system prompt,
//! - `critique` surfaces the cross-critiques that round already produced
//!   (no further model calls),
//! - `finalize` cleans the winning content for presentation and folds in
//!   the critique bookkeeping.

use crate::ports::context_provider::{ContextProvider, ContextQuery};
use crate::ports::response_cleaner::ResponseCleaner;
use crate::use_cases::run_council::{CouncilEngine, CouncilError};
use async_trait::async_trait;
use counsel_domain::{AgentDomain, AgentInput, AgentOutput, AdvisorPrompt, CouncilPrompt};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from an advisory agent's model-backed phases
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error(transparent)]
    Council(#[from] CouncilError),
}

/// A domain-specialized advisor executing the three pipeline phases
#[async_trait]
pub trait AdvisoryAgent: Send + Sync {
    fn domain(&self) -> AgentDomain;

    /// Produce the draft answer for the (already sanitized) input.
    async fn draft(&self, input: &AgentInput) -> Result<AgentOutput, AdvisorError>;

    /// Evaluate the draft, producing the critique-phase output.
    async fn critique(
        &self,
        input: &AgentInput,
        draft: &AgentOutput,
    ) -> Result<AgentOutput, AdvisorError>;

    /// Produce the final answer from the draft and its critique.
    async fn finalize(
        &self,
        input: &AgentInput,
        draft: &AgentOutput,
        critique: &AgentOutput,
    ) -> Result<AgentOutput, AdvisorError>;
}

/// Council-backed advisor, parameterized only by domain
pub struct CouncilAdvisor {
    domain: AgentDomain,
    engine: Arc<CouncilEngine>,
    context: Arc<dyn ContextProvider>,
    cleaner: Arc<dyn ResponseCleaner>,
}

impl CouncilAdvisor {
    pub fn new(
        domain: AgentDomain,
        engine: Arc<CouncilEngine>,
        context: Arc<dyn ContextProvider>,
        cleaner: Arc<dyn ResponseCleaner>,
    ) -> Self {
        Self {
            domain,
            engine,
            context,
            cleaner,
        }
    }

    /// Assemble the user-facing prompt: retrieved context first, then the
    /// caller's documents, then the question itself.
    async fn build_prompt(&self, input: &AgentInput) -> String {
        let mut query = ContextQuery::new(&input.prompt, self.domain);
        if let Some(sector) = input.context.get("sector") {
            query = query.with_sector(sector);
        }
        if let Some(region) = input.context.get("region") {
            query = query.with_region(region);
        }
        if let Some(jurisdictions) = input.context.get("jurisdictions") {
            for j in jurisdictions.split(',').filter(|j| !j.trim().is_empty()) {
                query = query.with_jurisdiction(j.trim());
            }
        }
        let retrieved = self.context.get_context(&query).await;

        let mut sections = String::new();
        if !retrieved.is_empty() {
            let _ = writeln!(sections, "Relevant background:\n{retrieved}\n");
        }
        for (i, doc) in input.documents.iter().enumerate() {
            let _ = writeln!(sections, "Document {}:\n{doc}\n", i + 1);
        }
        CouncilPrompt::generate(&input.prompt, &sections)
    }
}

#[async_trait]
impl AdvisoryAgent for CouncilAdvisor {
    fn domain(&self) -> AgentDomain {
        self.domain
    }

    async fn draft(&self, input: &AgentInput) -> Result<AgentOutput, AdvisorError> {
        let user_prompt = self.build_prompt(input).await;
        let run = self
            .engine
            .run(AdvisorPrompt::system(self.domain), &user_prompt)
            .await?;

        debug!(
            domain = %self.domain,
            models = run.metadata.models_used,
            tokens = run.metadata.total_tokens,
            "Draft council run complete"
        );

        let critiques_json = serde_json::to_value(&run.critiques).unwrap_or_default();
        Ok(AgentOutput::new(run.final_response.clone(), run.confidence())
            .with_meta("models_used", run.metadata.models_used as u64)
            .with_meta("total_tokens", run.metadata.total_tokens as u64)
            .with_meta("winning_label", run.consensus.winning_label.clone())
            .with_meta("average_score", run.consensus.average_score)
            .with_meta("critiques", critiques_json))
    }

    async fn critique(
        &self,
        _input: &AgentInput,
        draft: &AgentOutput,
    ) -> Result<AgentOutput, AdvisorError> {
        // The draft round already cross-critiqued every candidate; this
        // phase renders that record rather than spending more tokens.
        let mut summary = String::new();
        let critiques = draft
            .metadata
            .get("critiques")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        if critiques.is_empty() {
            summary.push_str("No peer critiques were produced for this draft.");
        } else {
            for c in &critiques {
                let score = c.get("score").and_then(|v| v.as_u64()).unwrap_or(0);
                let feedback = c.get("feedback").and_then(|v| v.as_str()).unwrap_or("");
                let _ = writeln!(summary, "- scored {score}/10: {feedback}");
            }
        }

        Ok(AgentOutput::new(summary, draft.confidence)
            .with_meta("critique_count", critiques.len() as u64))
    }

    async fn finalize(
        &self,
        _input: &AgentInput,
        draft: &AgentOutput,
        critique: &AgentOutput,
    ) -> Result<AgentOutput, AdvisorError> {
        let cleaned = self.cleaner.clean(&draft.content);
        let mut out = AgentOutput::new(cleaned, draft.confidence)
            .with_meta("advisor", self.domain.as_str());
        for (key, value) in &draft.metadata {
            if key != "critiques" {
                out.metadata.insert(key.clone(), value.clone());
            }
        }
        if let Some(count) = critique.metadata.get("critique_count") {
            out.metadata.insert("critique_count".into(), count.clone());
        }
        out.sources = draft.sources.clone();
        Ok(out)
    }
}

/// Flat lookup of advisory agents by domain
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentDomain, Arc<dyn AdvisoryAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Arc<dyn AdvisoryAgent>) {
        self.agents.insert(agent.domain(), agent);
    }

    pub fn get(&self, domain: AgentDomain) -> Option<Arc<dyn AdvisoryAgent>> {
        self.agents.get(&domain).cloned()
    }

    pub fn domains(&self) -> Vec<AgentDomain> {
        let mut domains: Vec<AgentDomain> = self.agents.keys().copied().collect();
        domains.sort_by_key(|d| d.as_str().to_string());
        domains
    }

    /// Register a council-backed advisor for every known domain
    pub fn with_all_domains(
        engine: Arc<CouncilEngine>,
        context: Arc<dyn ContextProvider>,
        cleaner: Arc<dyn ResponseCleaner>,
    ) -> Self {
        let mut registry = Self::new();
        for domain in AgentDomain::all() {
            registry.register(Arc::new(CouncilAdvisor::new(
                domain,
                Arc::clone(&engine),
                Arc::clone(&context),
                Arc::clone(&cleaner),
            )));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubAgent(AgentDomain);

    #[async_trait]
    impl AdvisoryAgent for StubAgent {
        fn domain(&self) -> AgentDomain {
            self.0
        }
        async fn draft(&self, _input: &AgentInput) -> Result<AgentOutput, AdvisorError> {
            Ok(AgentOutput::new("draft", 0.5))
        }
        async fn critique(
            &self,
            _input: &AgentInput,
            draft: &AgentOutput,
        ) -> Result<AgentOutput, AdvisorError> {
            Ok(AgentOutput::new("critique", draft.confidence))
        }
        async fn finalize(
            &self,
            _input: &AgentInput,
            draft: &AgentOutput,
            _critique: &AgentOutput,
        ) -> Result<AgentOutput, AdvisorError> {
            Ok(draft.clone())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(StubAgent(AgentDomain::Legal)));
        registry.register(Arc::new(StubAgent(AgentDomain::Finance)));

        assert!(registry.get(AgentDomain::Legal).is_some());
        assert!(registry.get(AgentDomain::Investor).is_none());
        assert_eq!(registry.domains().len(), 2);
    }

    #[test]
    fn test_registry_replaces_on_duplicate_domain() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(StubAgent(AgentDomain::Legal)));
        registry.register(Arc::new(StubAgent(AgentDomain::Legal)));
        assert_eq!(registry.domains().len(), 1);
    }

    #[tokio::test]
    async fn test_critique_summarizes_draft_metadata() {
        use crate::ports::context_provider::NoContext;
        use crate::ports::model_gateway::{
            Completion, CompletionRequest, GatewayError, ModelGateway,
        };
        use crate::ports::response_cleaner::NoClean;
        use crate::use_cases::run_council::CouncilSettings;
        use counsel_domain::BackendId;

        struct NoGateway;

        #[async_trait]
        impl ModelGateway for NoGateway {
            fn backends(&self) -> Vec<BackendId> {
                Vec::new()
            }
            fn is_healthy(&self, _backend: &BackendId) -> bool {
                false
            }
            async fn complete(
                &self,
                _backend: &BackendId,
                _request: &CompletionRequest,
            ) -> Result<Completion, GatewayError> {
                Err(GatewayError::BackendUnavailable("none".into()))
            }
        }

        let advisor = CouncilAdvisor::new(
            AgentDomain::Finance,
            Arc::new(CouncilEngine::new(
                Arc::new(NoGateway),
                CouncilSettings::default(),
            )),
            Arc::new(NoContext),
            Arc::new(NoClean),
        );

        let draft = AgentOutput::new("draft content", 0.7).with_meta(
            "critiques",
            serde_json::json!([
                {"score": 8, "feedback": "solid numbers"},
                {"score": 6, "feedback": "missing runway analysis"}
            ]),
        );
        let input = AgentInput::new("How long is our runway?");

        let critique = advisor.critique(&input, &draft).await.unwrap();
        assert!(critique.content.contains("8/10"));
        assert!(critique.content.contains("missing runway analysis"));
        assert_eq!(
            critique.metadata.get("critique_count").unwrap().as_u64(),
            Some(2)
        );

        let fin = advisor.finalize(&input, &draft, &critique).await.unwrap();
        assert_eq!(fin.content, "draft content");
        assert!(!fin.metadata.contains_key("critiques"));
    }
}
