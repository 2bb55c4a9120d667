//! Run Council use case
//!
//! Drives one execution of the council protocol: fan a prompt out to the
//! healthy backends, anonymize the surviving responses, cross-critique
//! them, score consensus, and synthesize the final answer.
//!
//! Within the generate and critique steps every backend call runs
//! concurrently and is individually bounded by `per_call_timeout`; a step
//! never waits on a straggler beyond that. A backend that errors or times
//! out is dropped from the run, not retried.
//!
//! Cancellation: dropping the future returned by [`CouncilEngine::run`]
//! drops its `JoinSet`s, which aborts every in-flight backend call.

use crate::ports::model_gateway::{CompletionRequest, ModelGateway};
use counsel_domain::{
    BackendId, Consensus, CouncilPrompt, CouncilResponse, CouncilRun, CouncilRunMetadata,
    Critique, NEUTRAL_SCORE, Panel, parse_critique_score, score_consensus,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that end a council run
#[derive(Error, Debug)]
pub enum CouncilError {
    #[error("Insufficient participants: {got} responded, {min} required")]
    InsufficientParticipants { got: usize, min: usize },
}

/// Tunables for one council run
#[derive(Debug, Clone)]
pub struct CouncilSettings {
    /// Minimum surviving participants for a run to proceed
    pub min_models: usize,
    /// Maximum backends selected into a run
    pub max_models: usize,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Per-backend-call timeout for generate and critique steps
    pub per_call_timeout: Duration,
}

impl Default for CouncilSettings {
    fn default() -> Self {
        Self {
            min_models: 2,
            max_models: 5,
            temperature: 0.7,
            max_tokens: 2048,
            per_call_timeout: Duration::from_secs(45),
        }
    }
}

/// Use case for running the council protocol over the model gateway
pub struct CouncilEngine {
    gateway: Arc<dyn ModelGateway>,
    settings: CouncilSettings,
}

impl CouncilEngine {
    pub fn new(gateway: Arc<dyn ModelGateway>, settings: CouncilSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> &CouncilSettings {
        &self.settings
    }

    /// Execute one full council run
    pub async fn run(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<CouncilRun, CouncilError> {
        let started = Instant::now();

        // Step 1: select healthy backends
        let selected = self.select_backends()?;
        info!("Council run starting with {} backends", selected.len());

        // Step 2: generate concurrently
        let responses = self
            .generate(&selected, system_prompt, user_prompt)
            .await?;
        let participants: Vec<BackendId> = responses.iter().map(|r| r.backend.clone()).collect();

        // Step 3: anonymize — bijection built once, shuffled
        let panel = Panel::shuffled(participants.clone());

        // Step 4: cross-critique (skipped for a single survivor)
        let critiques = if responses.len() > 1 {
            self.cross_critique(&panel, &responses, user_prompt).await
        } else {
            debug!("Single participant, skipping cross-critique");
            Vec::new()
        };

        // Step 5: consensus
        let consensus = score_consensus(&panel, &critiques);
        debug!(
            winner = %consensus.winning_label,
            average = consensus.average_score,
            "Consensus computed"
        );

        // Step 6: synthesize
        let (final_response, synthesis_tokens) = self
            .synthesize(&panel, &responses, &critiques, &consensus, user_prompt)
            .await;

        let total_tokens = responses.iter().map(|r| r.token_count).sum::<u32>() + synthesis_tokens;

        Ok(CouncilRun {
            metadata: CouncilRunMetadata {
                models_used: participants.len(),
                total_tokens,
                processing_time_ms: started.elapsed().as_millis() as u64,
            },
            participants,
            responses,
            critiques,
            consensus,
            final_response,
        })
    }

    /// Select up to `max_models` healthy backends, failing fast when fewer
    /// than `min_models` are available
    fn select_backends(&self) -> Result<Vec<BackendId>, CouncilError> {
        let healthy: Vec<BackendId> = self
            .gateway
            .backends()
            .into_iter()
            .filter(|b| self.gateway.is_healthy(b))
            .take(self.settings.max_models)
            .collect();

        if healthy.len() < self.settings.min_models {
            warn!(
                "Only {} healthy backends, {} required",
                healthy.len(),
                self.settings.min_models
            );
            return Err(CouncilError::InsufficientParticipants {
                got: healthy.len(),
                min: self.settings.min_models,
            });
        }
        Ok(healthy)
    }

    /// Issue the identical prompt to every selected backend concurrently.
    /// Failures and timeouts drop the backend from this run.
    async fn generate(
        &self,
        selected: &[BackendId],
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Vec<CouncilResponse>, CouncilError> {
        let request = CompletionRequest::new(system_prompt, user_prompt)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let mut join_set = JoinSet::new();
        for backend in selected {
            let gateway = Arc::clone(&self.gateway);
            let backend = backend.clone();
            let request = request.clone();
            let per_call = self.settings.per_call_timeout;

            join_set.spawn(async move {
                let result =
                    tokio::time::timeout(per_call, gateway.complete(&backend, &request)).await;
                (backend, result)
            });
        }

        let mut responses = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((backend, Ok(Ok(completion)))) => {
                    info!("Backend {} responded", backend);
                    responses.push(CouncilResponse::new(
                        backend,
                        completion.content,
                        completion.tokens,
                    ));
                }
                Ok((backend, Ok(Err(e)))) => {
                    warn!("Backend {} failed, dropping from run: {}", backend, e);
                }
                Ok((backend, Err(_))) => {
                    warn!("Backend {} timed out, dropping from run", backend);
                }
                Err(e) => {
                    warn!("Generate task join error: {}", e);
                }
            }
        }

        if responses.len() < self.settings.min_models {
            return Err(CouncilError::InsufficientParticipants {
                got: responses.len(),
                min: self.settings.min_models,
            });
        }

        // Deterministic pre-shuffle order: aggregation above is unordered
        responses.sort_by(|a, b| a.backend.key().cmp(&b.backend.key()));
        Ok(responses)
    }

    /// Every participant scores every other anonymized response,
    /// concurrently. A critic never sees its own response. Failed critique
    /// calls are logged and skipped; consensus works with what arrives.
    async fn cross_critique(
        &self,
        panel: &Panel,
        responses: &[CouncilResponse],
        user_prompt: &str,
    ) -> Vec<Critique> {
        let content_by_label: HashMap<String, String> = responses
            .iter()
            .filter_map(|r| {
                panel
                    .label_of(&r.backend)
                    .map(|label| (label, r.content.clone()))
            })
            .collect();

        let mut join_set = JoinSet::new();
        for response in responses {
            let critic = response.backend.clone();
            for (label, backend) in panel.labeled() {
                if *backend == critic {
                    continue; // no self-critique
                }
                let Some(content) = content_by_label.get(&label) else {
                    continue;
                };

                let gateway = Arc::clone(&self.gateway);
                let critic = critic.clone();
                let per_call = self.settings.per_call_timeout;
                let request = CompletionRequest::new(
                    CouncilPrompt::critique_system(),
                    CouncilPrompt::critique(user_prompt, &label, content),
                )
                .with_temperature(0.2)
                .with_max_tokens(512);

                join_set.spawn(async move {
                    let result =
                        tokio::time::timeout(per_call, gateway.complete(&critic, &request)).await;
                    (critic, label, result)
                });
            }
        }

        let mut critiques = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((critic, label, Ok(Ok(completion)))) => {
                    let score = parse_critique_score(&completion.content);
                    debug!("Critic {} scored response {}: {}", critic, label, score);
                    critiques.push(Critique::new(critic, label, score, completion.content));
                }
                Ok((critic, label, Ok(Err(e)))) => {
                    warn!("Critique by {} of {} failed: {}", critic, label, e);
                }
                Ok((critic, label, Err(_))) => {
                    warn!("Critique by {} of {} timed out", critic, label);
                }
                Err(e) => {
                    warn!("Critique task join error: {}", e);
                }
            }
        }
        critiques
    }

    /// Merge the winning response with the other critiques via a secondary
    /// pass on the winning backend. Falls back to the winning response
    /// verbatim when the synthesis call fails — the draft already carries a
    /// vetted answer.
    async fn synthesize(
        &self,
        panel: &Panel,
        responses: &[CouncilResponse],
        critiques: &[Critique],
        consensus: &Consensus,
        user_prompt: &str,
    ) -> (String, u32) {
        let winner_backend = panel.backend_of(&consensus.winning_label);
        let winning_content = winner_backend
            .and_then(|b| responses.iter().find(|r| &r.backend == b))
            .map(|r| r.content.as_str())
            .unwrap_or_default();

        // Single survivor: nothing to merge, pass the winner through
        if critiques.is_empty() {
            return (winning_content.to_string(), 0);
        }

        let feedback: Vec<(String, String)> = critiques
            .iter()
            .filter(|c| c.target_label != consensus.winning_label)
            .map(|c| (c.target_label.clone(), c.feedback.clone()))
            .collect();

        let request = CompletionRequest::new(
            CouncilPrompt::synthesis_system(),
            CouncilPrompt::synthesis(user_prompt, winning_content, &feedback),
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens);

        let Some(backend) = winner_backend else {
            return (winning_content.to_string(), 0);
        };

        match tokio::time::timeout(
            self.settings.per_call_timeout,
            self.gateway.complete(backend, &request),
        )
        .await
        {
            Ok(Ok(completion)) => (completion.content, completion.tokens),
            Ok(Err(e)) => {
                warn!("Synthesis failed, falling back to winning response: {}", e);
                (winning_content.to_string(), 0)
            }
            Err(_) => {
                warn!("Synthesis timed out, falling back to winning response");
                (winning_content.to_string(), 0)
            }
        }
    }
}

/// Confidence reported for a run with no critiques (single survivor):
/// neutral score over the 10-point scale.
pub fn neutral_confidence() -> f64 {
    NEUTRAL_SCORE / 10.0
}
