//! Durable task queue and worker pool
//!
//! Tasks are persisted through the [`TaskStore`] port on every status
//! transition, so a restart recovers queued work instead of losing it.
//! A fixed pool of workers pulls task ids from a shared channel; each
//! attempt is bounded by a timeout, and failed attempts are retried with
//! exponential backoff and jitter until the retry budget runs out.
//!
//! Terminal stream events are published here and only here: exactly one
//! `done` or `error` per task, the latter only after the last attempt.
//! A retried attempt re-runs the whole pipeline from the draft phase;
//! completed phases of a failed attempt are not reused.

use crate::ports::event_bus::EventBus;
use crate::ports::task_store::{StoreError, TaskStore};
use crate::use_cases::run_pipeline::{PipelineError, PipelineRunner};
use counsel_domain::{StreamEvent, Task, TaskId, TaskStatus};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors surfaced by queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Queue is shut down")]
    Closed,
}

/// Retry schedule for failed attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay randomized away to spread thundering herds
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt number (2 = first retry): doubling
    /// backoff, capped, with jitter subtracted.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2).min(16);
        let raw = self.base_delay.as_millis() as u64 * (1u64 << exponent);
        let capped = raw.min(self.max_delay.as_millis() as u64);
        let jitter_ms = (capped as f64 * self.jitter * rand::rng().random::<f64>()) as u64;
        Duration::from_millis(capped.saturating_sub(jitter_ms))
    }

    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

/// Queue tunables
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Worker pool size; also the maximum number of concurrently running
    /// tasks
    pub workers: usize,
    /// Wall-clock budget for one attempt
    pub task_timeout: Duration,
    pub retry: RetryPolicy,
    /// Channel capacity for queued task ids
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            task_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            capacity: 256,
        }
    }
}

/// Durable queue executing tasks on a bounded worker pool
pub struct TaskQueue {
    store: Arc<dyn TaskStore>,
    runner: Arc<PipelineRunner>,
    bus: Arc<dyn EventBus>,
    config: QueueConfig,
    tx: mpsc::Sender<TaskId>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskQueue {
    /// Create the queue, recover persisted pending work, and start the
    /// worker pool.
    pub async fn start(
        store: Arc<dyn TaskStore>,
        runner: Arc<PipelineRunner>,
        bus: Arc<dyn EventBus>,
        config: QueueConfig,
    ) -> Result<Arc<Self>, QueueError> {
        let (tx, rx) = mpsc::channel(config.capacity);
        let queue = Arc::new(Self {
            store,
            runner,
            bus,
            config,
            tx,
            shutdown: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
        });

        // Workers first, so recovery cannot block on a full channel
        let rx = Arc::new(Mutex::new(rx));
        {
            let mut workers = queue.workers.lock().await;
            for worker_id in 0..queue.config.workers {
                let queue = Arc::clone(&queue);
                let rx = Arc::clone(&rx);
                workers.push(tokio::spawn(async move {
                    queue.worker_loop(worker_id, rx).await;
                }));
            }
        }
        queue.recover().await?;

        Ok(queue)
    }

    /// Persist a new task and hand it to the worker pool
    pub async fn enqueue(&self, task: Task) -> Result<TaskId, QueueError> {
        let id = task.id.clone();
        self.store.save(&task).await?;
        self.tx
            .send(id.clone())
            .await
            .map_err(|_| QueueError::Closed)?;
        debug!(task_id = %id, "Task enqueued");
        Ok(id)
    }

    /// Signal shutdown and wait for the pool: workers requeue their
    /// current task and exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            let _ = handle.await;
        }
        info!("Task queue shut down");
    }

    /// Requeue every non-terminal task found in the store. Tasks caught
    /// mid-attempt by a crash are still `Running`; they go back to
    /// `Pending` first.
    async fn recover(&self) -> Result<(), QueueError> {
        let pending = self.store.pending().await?;
        if pending.is_empty() {
            return Ok(());
        }
        info!("Recovering {} persisted tasks", pending.len());
        for mut task in pending {
            if task.status == TaskStatus::Running {
                if task.requeue().is_ok() {
                    self.store.save(&task).await?;
                }
            }
            if self.tx.send(task.id.clone()).await.is_err() {
                return Err(QueueError::Closed);
            }
        }
        Ok(())
    }

    async fn worker_loop(&self, worker_id: usize, rx: Arc<Mutex<mpsc::Receiver<TaskId>>>) {
        debug!(worker_id, "Worker started");
        loop {
            let task_id = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    id = rx.recv() => match id {
                        Some(id) => id,
                        None => break,
                    },
                }
            };
            self.process(worker_id, task_id).await;
        }
        debug!(worker_id, "Worker stopped");
    }

    /// Execute one attempt of one task
    async fn process(&self, worker_id: usize, task_id: TaskId) {
        let mut task = match self.store.load(&task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                warn!(task_id = %task_id, "Queued task missing from store, skipping");
                return;
            }
            Err(e) => {
                error!(task_id = %task_id, "Failed to load task: {e}");
                return;
            }
        };
        if task.is_terminal() {
            debug!(task_id = %task_id, "Task already terminal, skipping");
            return;
        }

        if let Err(e) = task.start_attempt() {
            warn!(task_id = %task_id, "Cannot start attempt: {e}");
            return;
        }
        if let Err(e) = self.store.save(&task).await {
            error!(task_id = %task_id, "Failed to persist running status: {e}");
        }
        info!(
            worker_id,
            task_id = %task.id,
            attempt = task.attempts,
            domain = %task.agent_domain,
            "Attempt starting"
        );

        let attempt = tokio::select! {
            _ = self.shutdown.cancelled() => AttemptOutcome::Interrupted,
            result = tokio::time::timeout(self.config.task_timeout, self.runner.run(&mut task)) => {
                match result {
                    Ok(Ok(())) => AttemptOutcome::Completed,
                    Ok(Err(e)) => AttemptOutcome::Failed(e),
                    Err(_) => AttemptOutcome::TimedOut,
                }
            }
        };

        match attempt {
            AttemptOutcome::Completed => self.finish_completed(task).await,
            AttemptOutcome::Interrupted => {
                // Shutdown mid-attempt: back to pending for the next start
                if task.requeue().is_ok() {
                    if let Err(e) = self.store.save(&task).await {
                        error!(task_id = %task.id, "Failed to persist requeue: {e}");
                    }
                }
            }
            AttemptOutcome::TimedOut => {
                self.finish_failed(task, "Attempt timed out".to_string(), true)
                    .await;
            }
            AttemptOutcome::Failed(e) => {
                let transient = is_transient(&e);
                self.finish_failed(task, e.to_string(), transient).await;
            }
        }
    }

    async fn finish_completed(&self, mut task: Task) {
        if let Err(e) = task.complete() {
            error!(task_id = %task.id, "Cannot complete task: {e}");
            return;
        }
        if let Err(e) = self.store.save(&task).await {
            error!(task_id = %task.id, "Failed to persist completion: {e}");
        }
        info!(task_id = %task.id, attempts = task.attempts, "Task completed");
        self.bus
            .publish(StreamEvent::done(
                task.id.clone(),
                PipelineRunner::result_payload(&task),
            ))
            .await;
    }

    async fn finish_failed(&self, mut task: Task, message: String, transient: bool) {
        let retry = transient && self.config.retry.allows_retry(task.attempts);
        if retry {
            let delay = self.config.retry.delay_before(task.attempts + 1);
            warn!(
                task_id = %task.id,
                attempt = task.attempts,
                delay_ms = delay.as_millis() as u64,
                "Attempt failed, will retry: {message}"
            );
            if task.requeue().is_err() {
                return;
            }
            if let Err(e) = self.store.save(&task).await {
                error!(task_id = %task.id, "Failed to persist requeue: {e}");
                return;
            }
            // Delay off-worker so the pool stays busy
            let tx = self.tx.clone();
            let id = task.id.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        let _ = tx.send(id).await;
                    }
                }
            });
            return;
        }

        if let Err(e) = task.fail(&message) {
            error!(task_id = %task.id, "Cannot fail task: {e}");
            return;
        }
        if let Err(e) = self.store.save(&task).await {
            error!(task_id = %task.id, "Failed to persist failure: {e}");
        }
        error!(task_id = %task.id, attempts = task.attempts, "Task failed: {message}");
        // The one and only terminal error event for this task
        self.bus
            .publish(StreamEvent::error(task.id.clone(), message))
            .await;
    }
}

enum AttemptOutcome {
    Completed,
    Failed(PipelineError),
    TimedOut,
    Interrupted,
}

/// Whether an attempt failure is worth retrying. Misconfiguration and
/// state-machine violations are permanent; backend trouble is not.
fn is_transient(error: &PipelineError) -> bool {
    match error {
        PipelineError::UnknownAgentDomain(_) | PipelineError::Task(_) => false,
        PipelineError::Phase { .. } => {
            let message = error.to_string().to_lowercase();
            const PERMANENT: [&str; 3] = ["invalid api key", "unauthorized", "forbidden"];
            !PERMANENT.iter().any(|p| message.contains(p))
        }
    }
}
