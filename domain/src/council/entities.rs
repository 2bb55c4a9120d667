//! Council run result types

use crate::core::backend::BackendId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response from one surviving participant in the generate step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilResponse {
    /// The backend that produced this response
    pub backend: BackendId,
    /// The response content
    pub content: String,
    /// Tokens consumed producing it (prompt + completion)
    pub token_count: u32,
}

impl CouncilResponse {
    pub fn new(backend: BackendId, content: impl Into<String>, token_count: u32) -> Self {
        Self {
            backend,
            content: content.into(),
            token_count,
        }
    }
}

/// One critic's score of one anonymized response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critique {
    /// The backend that performed the critique
    pub critic: BackendId,
    /// Anonymous label of the response being scored (e.g. "A")
    pub target_label: String,
    /// 1-10 integer score
    pub score: u8,
    /// Brief justification
    pub feedback: String,
}

impl Critique {
    pub fn new(
        critic: BackendId,
        target_label: impl Into<String>,
        score: u8,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            critic,
            target_label: target_label.into(),
            score: score.clamp(1, 10),
            feedback: feedback.into(),
        }
    }
}

/// Cross-critic consensus over a run's responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consensus {
    /// Mean critic score per anonymous label
    pub per_response_score: HashMap<String, f64>,
    /// Mean over all responses' means
    pub average_score: f64,
    /// Label of the highest-scoring response
    pub winning_label: String,
}

/// Bookkeeping metadata attached to every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilRunMetadata {
    pub models_used: usize,
    pub total_tokens: u32,
    pub processing_time_ms: u64,
}

/// One complete execution of the council protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilRun {
    /// Backends whose responses survived the generate step
    pub participants: Vec<BackendId>,
    /// One response per surviving participant
    pub responses: Vec<CouncilResponse>,
    /// At most n * (n - 1) entries for n participants; never self-critique
    pub critiques: Vec<Critique>,
    pub consensus: Consensus,
    /// The synthesized (or passed-through winning) answer
    pub final_response: String,
    pub metadata: CouncilRunMetadata,
}

impl CouncilRun {
    /// Caller-facing confidence derived from consensus (averageScore / 10)
    pub fn confidence(&self) -> f64 {
        (self.consensus.average_score / 10.0).clamp(0.0, 1.0)
    }

    /// Human-readable names of the participants, for run metadata
    pub fn participant_names(&self) -> Vec<String> {
        self.participants.iter().map(|b| b.name.clone()).collect()
    }
}
