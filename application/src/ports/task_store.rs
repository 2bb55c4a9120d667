//! Task Store port
//!
//! Opaque durable persistence for [`Task`] records. The queue writes
//! through this port on every status transition so tasks survive process
//! restarts.

use async_trait::async_trait;
use counsel_domain::{Task, TaskId};
use thiserror::Error;

/// Errors from the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable storage for task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist the current state of a task (upsert).
    async fn save(&self, task: &Task) -> Result<(), StoreError>;

    /// Load a task by id.
    async fn load(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// Tasks that are not terminal, for recovery on startup.
    async fn pending(&self) -> Result<Vec<Task>, StoreError>;
}
