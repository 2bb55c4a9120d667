//! Orchestrator: the caller-facing surface of the advisory system
//!
//! Wraps the queue, store, and event bus behind four operations: submit a
//! task, run one to completion, query status, and subscribe to progress.

use crate::ports::event_bus::EventBus;
use crate::ports::task_store::{StoreError, TaskStore};
use crate::queue::{QueueError, TaskQueue};
use counsel_domain::{AgentDomain, AgentInput, StreamEvent, Task, TaskId};
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors from orchestrator operations
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Task '{0}' not found")]
    NotFound(TaskId),
}

/// What a watch attaches to: live events, or the finished record when
/// the task is already terminal and no further events will arrive
pub enum TaskWatch {
    Finished(Box<Task>),
    Live(BoxStream<'static, StreamEvent>),
}

impl std::fmt::Debug for TaskWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finished(task) => f.debug_tuple("Finished").field(task).finish(),
            Self::Live(_) => f.debug_tuple("Live").finish(),
        }
    }
}

/// Entry point for submitting and observing advisory tasks
pub struct Orchestrator {
    queue: Arc<TaskQueue>,
    store: Arc<dyn TaskStore>,
    bus: Arc<dyn EventBus>,
}

impl Orchestrator {
    pub fn new(queue: Arc<TaskQueue>, store: Arc<dyn TaskStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { queue, store, bus }
    }

    /// Enqueue a new task and return its id without waiting for execution
    pub async fn submit(
        &self,
        domain: AgentDomain,
        input: AgentInput,
    ) -> Result<TaskId, OrchestratorError> {
        let id = TaskId::new(uuid::Uuid::new_v4().to_string());
        let task = Task::new(id.clone(), domain, input);
        self.queue.enqueue(task).await?;
        info!(task_id = %id, domain = %domain, "Task submitted");
        Ok(id)
    }

    /// Submit a task and wait for it to reach a terminal status.
    ///
    /// Progress streams through the bus as usual; this method observes the
    /// store, so it sees the outcome even if every stream event is missed.
    pub async fn run(
        &self,
        domain: AgentDomain,
        input: AgentInput,
    ) -> Result<Task, OrchestratorError> {
        let id = self.submit(domain, input).await?;
        loop {
            if let Some(task) = self.store.load(&id).await? {
                if task.is_terminal() {
                    return Ok(task);
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Current persisted state of a task
    pub async fn status(&self, id: &TaskId) -> Result<Task, OrchestratorError> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))
    }

    /// Stream of progress events: buffered history first, then live
    pub async fn subscribe(&self, id: &TaskId) -> BoxStream<'static, StreamEvent> {
        self.bus.subscribe(id).await
    }

    /// Follow a task to completion. A task that already reached a
    /// terminal status has no live channel to offer, so the persisted
    /// record is returned instead of a stream that would never end.
    pub async fn watch(&self, id: &TaskId) -> Result<TaskWatch, OrchestratorError> {
        let task = self.status(id).await?;
        if task.is_terminal() {
            return Ok(TaskWatch::Finished(Box::new(task)));
        }
        Ok(TaskWatch::Live(self.subscribe(id).await))
    }

    /// Drain the worker pool and stop
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::pii_guard::NoPiiGuard;
    use crate::queue::QueueConfig;
    use crate::use_cases::advisors::{AdvisorError, AdvisoryAgent, AgentRegistry};
    use crate::use_cases::run_pipeline::PipelineRunner;
    use async_trait::async_trait;
    use counsel_domain::{AgentOutput, TaskStatus};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStore {
        tasks: Mutex<HashMap<TaskId, Task>>,
    }

    #[async_trait]
    impl TaskStore for MemoryStore {
        async fn save(&self, task: &Task) -> Result<(), StoreError> {
            self.tasks
                .lock()
                .unwrap()
                .insert(task.id.clone(), task.clone());
            Ok(())
        }
        async fn load(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
            Ok(self.tasks.lock().unwrap().get(id).cloned())
        }
        async fn pending(&self) -> Result<Vec<Task>, StoreError> {
            Ok(Vec::new())
        }
    }

    struct NullBus;

    #[async_trait]
    impl EventBus for NullBus {
        async fn publish(&self, _event: StreamEvent) {}
        async fn subscribe(&self, _task_id: &TaskId) -> BoxStream<'static, StreamEvent> {
            Box::pin(futures::stream::empty())
        }
    }

    struct InstantAgent;

    #[async_trait]
    impl AdvisoryAgent for InstantAgent {
        fn domain(&self) -> AgentDomain {
            AgentDomain::Investor
        }
        async fn draft(&self, _input: &AgentInput) -> Result<AgentOutput, AdvisorError> {
            Ok(AgentOutput::new("pitch feedback", 0.75))
        }
        async fn critique(
            &self,
            _input: &AgentInput,
            draft: &AgentOutput,
        ) -> Result<AgentOutput, AdvisorError> {
            Ok(draft.clone())
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

    async fn orchestrator() -> Orchestrator {
        let store = Arc::new(MemoryStore {
            tasks: Mutex::new(HashMap::new()),
        });
        let bus = Arc::new(NullBus);
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(InstantAgent));
        let runner = Arc::new(PipelineRunner::new(
            Arc::new(registry),
            Arc::new(NoPiiGuard),
            Arc::clone(&bus) as Arc<dyn EventBus>,
        ));
        let queue = TaskQueue::start(
            Arc::clone(&store) as Arc<dyn TaskStore>,
            runner,
            Arc::clone(&bus) as Arc<dyn EventBus>,
            QueueConfig::default(),
        )
        .await
        .unwrap();
        Orchestrator::new(queue, store, bus)
    }

    #[tokio::test]
    async fn test_run_returns_completed_task() {
        let orch = orchestrator().await;
        let task = orch
            .run(AgentDomain::Investor, AgentInput::new("Rate our deck"))
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.phase_results.len(), 3);
        orch.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_returns_queryable_id() {
        let orch = orchestrator().await;
        let id = orch
            .submit(AgentDomain::Investor, AgentInput::new("Rate our deck"))
            .await
            .unwrap();

        // Status is available immediately, in some pre- or post-run state
        let task = orch.status(&id).await.unwrap();
        assert_eq!(task.id, id);
        orch.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_of_unknown_task_is_not_found() {
        let orch = orchestrator().await;
        let err = orch.status(&TaskId::new("nope")).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound(_)));
        orch.shutdown().await;
    }

    #[tokio::test]
    async fn test_watch_of_finished_task_returns_record() {
        let orch = orchestrator().await;
        let task = orch
            .run(AgentDomain::Investor, AgentInput::new("Rate our deck"))
            .await
            .unwrap();

        match orch.watch(&task.id).await.unwrap() {
            TaskWatch::Finished(watched) => {
                assert_eq!(watched.status, TaskStatus::Completed);
            }
            TaskWatch::Live(_) => panic!("finished task must not hand out a live stream"),
        }
        orch.shutdown().await;
    }

    #[tokio::test]
    async fn test_watch_of_unknown_task_is_not_found() {
        let orch = orchestrator().await;
        let err = orch.watch(&TaskId::new("nope")).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound(_)));
        orch.shutdown().await;
    }
}
