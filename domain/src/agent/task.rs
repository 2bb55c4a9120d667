//! Task entity: the unit of orchestration work
//!
//! A [`Task`] is created on enqueue, mutated exclusively by the worker that
//! owns the current attempt, and immutable once it reaches a terminal
//! status. Phase results are append-only and strictly ordered
//! draft → critique → final; status moves pending → running →
//! {completed, failed} and never backward. The mutators below enforce both
//! invariants.

use super::entities::{AgentDomain, AgentInput, Phase, PhaseResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether this status may transition into `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Violations of the task state machine
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Phase {phase} appended out of order (expected {expected})")]
    PhaseOutOfOrder { phase: Phase, expected: Phase },

    #[error("Task is terminal and cannot be modified")]
    Terminal,
}

/// Unit of orchestration work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub agent_domain: AgentDomain,
    pub input: AgentInput,
    pub status: TaskStatus,
    /// Append-only, strictly ordered draft → critique → final
    #[serde(default)]
    pub phase_results: Vec<PhaseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempt counter maintained by the queue (1-indexed once running)
    #[serde(default)]
    pub attempts: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, agent_domain: AgentDomain, input: AgentInput) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: id.into(),
            agent_domain,
            input,
            status: TaskStatus::Pending,
            phase_results: Vec::new(),
            error: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, to: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition_to(to) {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Mark the task running for a new attempt.
    ///
    /// A retry re-runs from scratch: earlier phase results are discarded
    /// because they belong to the failed attempt.
    pub fn start_attempt(&mut self) -> Result<(), TaskError> {
        self.transition(TaskStatus::Running)?;
        self.attempts += 1;
        self.phase_results.clear();
        self.error = None;
        Ok(())
    }

    /// Return a running task to pending so the queue can retry it.
    ///
    /// This is the one deliberate exception to forward-only transitions:
    /// it is only legal from `Running` and models "the attempt failed but
    /// the task is not terminal yet".
    pub fn requeue(&mut self) -> Result<(), TaskError> {
        if self.status != TaskStatus::Running {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: TaskStatus::Pending,
            });
        }
        self.status = TaskStatus::Pending;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Append a phase result, enforcing draft → critique → final ordering
    pub fn append_phase(&mut self, result: PhaseResult) -> Result<(), TaskError> {
        if self.status.is_terminal() {
            return Err(TaskError::Terminal);
        }
        let expected = match self.phase_results.last() {
            None => Phase::Draft,
            Some(prev) => match prev.phase {
                Phase::Draft => Phase::Critique,
                Phase::Critique => Phase::Final,
                Phase::Final => {
                    return Err(TaskError::PhaseOutOfOrder {
                        phase: result.phase,
                        expected: Phase::Final,
                    });
                }
            },
        };
        if result.phase != expected {
            return Err(TaskError::PhaseOutOfOrder {
                phase: result.phase,
                expected,
            });
        }
        self.phase_results.push(result);
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), TaskError> {
        self.transition(TaskStatus::Completed)
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TaskError> {
        self.transition(TaskStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The result of a specific phase, if recorded
    pub fn phase_result(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phase_results.iter().find(|r| r.phase == phase)
    }
}
