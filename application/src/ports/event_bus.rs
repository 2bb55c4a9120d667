//! Event Bus port
//!
//! Publish/subscribe with bounded replay for task progress events.
//! Publishing is strictly best-effort: implementations log and swallow
//! their own failures so streaming can never alter the outcome of the
//! underlying task.

use async_trait::async_trait;
use counsel_domain::{StreamEvent, TaskId};
use futures::stream::BoxStream;

/// Progress event transport shared by workers and subscribers
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event for its task. Infallible by contract: failures are
    /// handled (logged) inside the implementation.
    async fn publish(&self, event: StreamEvent);

    /// Subscribe to a task's events: buffered history first, then live
    /// events, ending after a terminal `done`/`error` event.
    async fn subscribe(&self, task_id: &TaskId) -> BoxStream<'static, StreamEvent>;
}
