//! Agent domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Advisory domain an agent specializes in
///
/// Closed set: each variant maps to one registered agent implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentDomain {
    Legal,
    Finance,
    Investor,
    Competitor,
}

impl AgentDomain {
    pub fn as_str(&self) -> &str {
        match self {
            AgentDomain::Legal => "legal",
            AgentDomain::Finance => "finance",
            AgentDomain::Investor => "investor",
            AgentDomain::Competitor => "competitor",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AgentDomain::Legal => "Legal Advisor",
            AgentDomain::Finance => "Finance Advisor",
            AgentDomain::Investor => "Investor Advisor",
            AgentDomain::Competitor => "Competitor Analyst",
        }
    }

    pub fn all() -> [AgentDomain; 4] {
        [
            AgentDomain::Legal,
            AgentDomain::Finance,
            AgentDomain::Investor,
            AgentDomain::Competitor,
        ]
    }
}

impl std::fmt::Display for AgentDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentDomain {
    type Err = crate::core::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legal" => Ok(AgentDomain::Legal),
            "finance" => Ok(AgentDomain::Finance),
            "investor" => Ok(AgentDomain::Investor),
            "competitor" => Ok(AgentDomain::Competitor),
            other => Err(crate::core::error::DomainError::UnknownAgentDomain(
                other.to_string(),
            )),
        }
    }
}

/// Input for one advisory task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentInput {
    /// The user's question or request
    pub prompt: String,
    /// Document excerpts supplied by the caller
    #[serde(default)]
    pub documents: Vec<String>,
    /// Caller/session/startup identifiers and arbitrary context
    #[serde(default)]
    pub context: HashMap<String, String>,
    /// Names to anonymize before prompts leave the system
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl AgentInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, doc: impl Into<String>) -> Self {
        self.documents.push(doc.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_identifier(mut self, name: impl Into<String>) -> Self {
        self.identifiers.push(name.into());
        self
    }
}

/// Output of one pipeline phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    /// The generated (or carried-forward) content
    pub content: String,
    /// Confidence in the content, 0.0 - 1.0
    pub confidence: f64,
    /// Ordered source references
    #[serde(default)]
    pub sources: Vec<String>,
    /// Open key-value metadata attached by the phase
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentOutput {
    pub fn new(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            sources: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Phase of the advisory pipeline, strictly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Draft,
    Critique,
    Final,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Draft => "draft",
            Phase::Critique => "critique",
            Phase::Final => "final",
        }
    }

    /// The phase that must directly precede this one, if any
    pub fn predecessor(&self) -> Option<Phase> {
        match self {
            Phase::Draft => None,
            Phase::Critique => Some(Phase::Draft),
            Phase::Final => Some(Phase::Critique),
        }
    }

    /// All phases in execution order
    pub fn ordered() -> [Phase; 3] {
        [Phase::Draft, Phase::Critique, Phase::Final]
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one completed pipeline phase, timestamped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub output: AgentOutput,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PhaseResult {
    pub fn new(phase: Phase, output: AgentOutput) -> Self {
        Self {
            phase,
            output,
            timestamp: chrono::Utc::now(),
        }
    }
}
