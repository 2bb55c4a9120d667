//! Run Pipeline use case
//!
//! Executes the three advisory phases for one task attempt: PII
//! sanitization, draft, critique, final, PII restore. Progress and
//! thinking events are published along the way; terminal done/error
//! events belong to the queue, which alone knows whether an attempt
//! failure is final.

use crate::ports::event_bus::EventBus;
use crate::ports::pii_guard::{PiiGuard, PiiMapping};
use crate::use_cases::advisors::{AdvisorError, AgentRegistry};
use counsel_domain::{
    AgentInput, AgentOutput, Phase, PhaseResult, StreamEvent, Task, TaskError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that fail one pipeline attempt
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No agent registered for domain '{0}'")]
    UnknownAgentDomain(String),

    #[error("Phase {phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: AdvisorError,
    },

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Drives a task through draft → critique → final
pub struct PipelineRunner {
    registry: Arc<AgentRegistry>,
    pii: Arc<dyn PiiGuard>,
    bus: Arc<dyn EventBus>,
}

impl PipelineRunner {
    pub fn new(
        registry: Arc<AgentRegistry>,
        pii: Arc<dyn PiiGuard>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self { registry, pii, bus }
    }

    /// Run every phase of one attempt, appending results to the task.
    ///
    /// The task must already be `Running`. On error the task is left with
    /// whatever phase prefix completed; the caller decides between retry
    /// and terminal failure.
    pub async fn run(&self, task: &mut Task) -> Result<(), PipelineError> {
        let agent = self
            .registry
            .get(task.agent_domain)
            .ok_or_else(|| PipelineError::UnknownAgentDomain(task.agent_domain.to_string()))?;
        let agent_name = task.agent_domain.display_name().to_string();

        let (input, mappings) = self.sanitize_input(&task.input);
        if !mappings.is_empty() {
            debug!(
                task_id = %task.id,
                substitutions = mappings.len(),
                "Sanitized identifiers before model calls"
            );
        }

        // Draft
        self.bus
            .publish(StreamEvent::progress(task.id.clone(), 10, "draft"))
            .await;
        self.bus
            .publish(StreamEvent::thinking(
                task.id.clone(),
                "Consulting the model council",
                &agent_name,
            ))
            .await;
        let draft = agent.draft(&input).await.map_err(|source| {
            PipelineError::Phase {
                phase: Phase::Draft,
                source,
            }
        })?;
        task.append_phase(PhaseResult::new(Phase::Draft, draft.clone()))?;
        info!(task_id = %task.id, confidence = draft.confidence, "Draft phase complete");

        // Critique
        self.bus
            .publish(StreamEvent::progress(task.id.clone(), 55, "critique"))
            .await;
        let critique = agent.critique(&input, &draft).await.map_err(|source| {
            PipelineError::Phase {
                phase: Phase::Critique,
                source,
            }
        })?;
        task.append_phase(PhaseResult::new(Phase::Critique, critique.clone()))?;

        // Final
        self.bus
            .publish(StreamEvent::progress(task.id.clone(), 85, "final"))
            .await;
        let mut final_output =
            agent
                .finalize(&input, &draft, &critique)
                .await
                .map_err(|source| PipelineError::Phase {
                    phase: Phase::Final,
                    source,
                })?;
        final_output.content = self.restore_output(&final_output.content, &mappings);
        self.bus
            .publish(StreamEvent::chunk(
                task.id.clone(),
                final_output.content.clone(),
                &agent_name,
            ))
            .await;
        task.append_phase(PhaseResult::new(Phase::Final, final_output))?;
        info!(task_id = %task.id, "Final phase complete");

        Ok(())
    }

    /// Sanitize every text field that will reach a model
    fn sanitize_input(&self, input: &AgentInput) -> (AgentInput, Vec<PiiMapping>) {
        let mut sanitized = input.clone();
        let mut mappings = Vec::new();

        let prompt = self.pii.sanitize(&input.prompt, &input.identifiers);
        sanitized.prompt = prompt.text;
        mappings.extend(prompt.mappings);

        for doc in &mut sanitized.documents {
            let result = self.pii.sanitize(doc, &input.identifiers);
            *doc = result.text;
            mappings.extend(result.mappings);
        }

        (sanitized, mappings)
    }

    fn restore_output(&self, content: &str, mappings: &[PiiMapping]) -> String {
        if mappings.is_empty() {
            content.to_string()
        } else {
            self.pii.restore(content, mappings)
        }
    }

    /// The final phase output of a completed task, serialized for a
    /// terminal `done` event
    pub fn result_payload(task: &Task) -> serde_json::Value {
        task.phase_result(Phase::Final)
            .map(|r| result_json(&r.output))
            .unwrap_or(serde_json::Value::Null)
    }
}

fn result_json(output: &AgentOutput) -> serde_json::Value {
    serde_json::json!({
        "content": output.content,
        "confidence": output.confidence,
        "sources": output.sources,
        "metadata": output.metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::pii_guard::{NoPiiGuard, Sanitized};
    use crate::use_cases::advisors::AdvisoryAgent;
    use async_trait::async_trait;
    use counsel_domain::{AgentDomain, TaskId, TaskStatus};
    use futures::stream::BoxStream;
    use std::sync::Mutex;

    struct RecordingBus {
        events: Mutex<Vec<StreamEvent>>,
    }

    impl RecordingBus {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
        fn kinds(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.kind.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl EventBus for RecordingBus {
        async fn publish(&self, event: StreamEvent) {
            self.events.lock().unwrap().push(event);
        }
        async fn subscribe(&self, _task_id: &TaskId) -> BoxStream<'static, StreamEvent> {
            Box::pin(futures::stream::empty())
        }
    }

    struct EchoAgent {
        fail_phase: Option<Phase>,
    }

    #[async_trait]
    impl AdvisoryAgent for EchoAgent {
        fn domain(&self) -> AgentDomain {
            AgentDomain::Legal
        }
        async fn draft(&self, input: &AgentInput) -> Result<AgentOutput, AdvisorError> {
            if self.fail_phase == Some(Phase::Draft) {
                return Err(AdvisorError::Council(
                    crate::use_cases::run_council::CouncilError::InsufficientParticipants {
                        got: 0,
                        min: 2,
                    },
                ));
            }
            Ok(AgentOutput::new(format!("draft of: {}", input.prompt), 0.8))
        }
        async fn critique(
            &self,
            _input: &AgentInput,
            draft: &AgentOutput,
        ) -> Result<AgentOutput, AdvisorError> {
            if self.fail_phase == Some(Phase::Critique) {
                return Err(AdvisorError::Council(
                    crate::use_cases::run_council::CouncilError::InsufficientParticipants {
                        got: 1,
                        min: 2,
                    },
                ));
            }
            Ok(AgentOutput::new("looks fine", draft.confidence))
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

    fn runner(agent: EchoAgent, pii: Arc<dyn PiiGuard>, bus: Arc<RecordingBus>) -> PipelineRunner {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(agent));
        PipelineRunner::new(Arc::new(registry), pii, bus)
    }

    fn running_task(prompt: &str) -> Task {
        let mut task = Task::new("t-1", AgentDomain::Legal, AgentInput::new(prompt));
        task.start_attempt().unwrap();
        task
    }

    #[tokio::test]
    async fn test_full_pipeline_appends_all_phases_in_order() {
        let bus = Arc::new(RecordingBus::new());
        let runner = runner(
            EchoAgent { fail_phase: None },
            Arc::new(NoPiiGuard),
            Arc::clone(&bus),
        );
        let mut task = running_task("Is this clause enforceable?");

        runner.run(&mut task).await.unwrap();

        let phases: Vec<Phase> = task.phase_results.iter().map(|r| r.phase).collect();
        assert_eq!(phases, Phase::ordered());
        // Progress events were published, but never a terminal one
        let kinds = bus.kinds();
        assert!(kinds.contains(&"progress".to_string()));
        assert!(!kinds.contains(&"done".to_string()));
        assert!(!kinds.contains(&"error".to_string()));
    }

    #[tokio::test]
    async fn test_draft_failure_leaves_no_phase_results() {
        let bus = Arc::new(RecordingBus::new());
        let runner = runner(
            EchoAgent {
                fail_phase: Some(Phase::Draft),
            },
            Arc::new(NoPiiGuard),
            Arc::clone(&bus),
        );
        let mut task = running_task("q");

        let err = runner.run(&mut task).await.unwrap_err();
        assert!(matches!(err, PipelineError::Phase { phase: Phase::Draft, .. }));
        assert!(task.phase_results.is_empty());
        assert_eq!(task.status, TaskStatus::Running);
    }

    #[tokio::test]
    async fn test_critique_failure_keeps_draft_prefix() {
        let bus = Arc::new(RecordingBus::new());
        let runner = runner(
            EchoAgent {
                fail_phase: Some(Phase::Critique),
            },
            Arc::new(NoPiiGuard),
            Arc::clone(&bus),
        );
        let mut task = running_task("q");

        let err = runner.run(&mut task).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Phase {
                phase: Phase::Critique,
                ..
            }
        ));
        assert_eq!(task.phase_results.len(), 1);
        assert_eq!(task.phase_results[0].phase, Phase::Draft);
    }

    #[tokio::test]
    async fn test_unregistered_domain_fails() {
        let bus = Arc::new(RecordingBus::new());
        let runner = PipelineRunner::new(
            Arc::new(AgentRegistry::new()),
            Arc::new(NoPiiGuard),
            Arc::clone(&bus) as Arc<dyn EventBus>,
        );
        let mut task = running_task("q");

        let err = runner.run(&mut task).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownAgentDomain(_)));
    }

    /// Guard that swaps a fixed name for a placeholder, to prove the
    /// pipeline sanitizes before the agent and restores after.
    struct SwapGuard;

    impl PiiGuard for SwapGuard {
        fn sanitize(&self, text: &str, identifiers: &[String]) -> Sanitized {
            let mut out = text.to_string();
            let mut mappings = Vec::new();
            for (i, id) in identifiers.iter().enumerate() {
                if out.contains(id.as_str()) {
                    let placeholder = format!("[COMPANY_{}]", i + 1);
                    out = out.replace(id.as_str(), &placeholder);
                    mappings.push(PiiMapping {
                        original: id.clone(),
                        placeholder,
                    });
                }
            }
            Sanitized { text: out, mappings }
        }

        fn restore(&self, text: &str, mappings: &[PiiMapping]) -> String {
            let mut out = text.to_string();
            for m in mappings.iter().rev() {
                out = out.replace(&m.placeholder, &m.original);
            }
            out
        }
    }

    #[tokio::test]
    async fn test_pii_round_trip_through_pipeline() {
        let bus = Arc::new(RecordingBus::new());
        let runner = runner(
            EchoAgent { fail_phase: None },
            Arc::new(SwapGuard),
            Arc::clone(&bus),
        );
        let mut task = Task::new(
            "t-pii",
            AgentDomain::Legal,
            AgentInput::new("Can Acme Robotics enforce this?").with_identifier("Acme Robotics"),
        );
        task.start_attempt().unwrap();

        runner.run(&mut task).await.unwrap();

        // The agent (echoing its input) never saw the real name
        let draft = task.phase_result(Phase::Draft).unwrap();
        assert!(draft.output.content.contains("[COMPANY_1]"));
        assert!(!draft.output.content.contains("Acme Robotics"));

        // The final output has it restored
        let fin = task.phase_result(Phase::Final).unwrap();
        assert!(fin.output.content.contains("Acme Robotics"));
        assert!(!fin.output.content.contains("[COMPANY_1]"));
    }
}
