//! Replay buffer for stream events
//!
//! Late subscribers get the buffered history of their task before live
//! events. The buffer is bounded per task (oldest events drop first) and
//! buffers expire wholesale after a TTL of inactivity.
//!
//! Appends are guarded by an advisory per-task lock with its own TTL, so
//! a writer that dies mid-append cannot wedge the buffer. The lock
//! protocol matters for stores shared between replicas; the in-memory
//! store honors it for interface parity.

use async_trait::async_trait;
use counsel_domain::{StreamEvent, TaskId};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct BufferSettings {
    /// Events kept per task
    pub capacity: usize,
    /// Idle time after which a task's buffer is dropped
    pub ttl: Duration,
    /// Advisory lock expiry
    pub lock_ttl: Duration,
    /// Lock acquisition attempts before falling back to an unlocked append
    pub lock_attempts: u32,
    /// Pause between lock attempts
    pub lock_retry_delay: Duration,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl: Duration::from_secs(3600),
            lock_ttl: Duration::from_secs(2),
            lock_attempts: 10,
            lock_retry_delay: Duration::from_millis(50),
        }
    }
}

/// Storage for per-task event history
#[async_trait]
pub trait BufferStore: Send + Sync {
    /// Try to take the advisory append lock. An expired lock is stolen.
    async fn try_lock(&self, task_id: &TaskId) -> bool;

    async fn unlock(&self, task_id: &TaskId);

    /// Append one event to its task's buffer, evicting the oldest entry
    /// when the buffer is at capacity.
    async fn append(&self, event: &StreamEvent);

    /// The buffered history for a task, oldest first
    async fn read(&self, task_id: &TaskId) -> Vec<StreamEvent>;
}

struct TaskBuffer {
    events: VecDeque<StreamEvent>,
    locked_at: Option<Instant>,
    touched: Instant,
}

impl TaskBuffer {
    fn new() -> Self {
        Self {
            events: VecDeque::new(),
            locked_at: None,
            touched: Instant::now(),
        }
    }
}

pub struct InMemoryBufferStore {
    settings: BufferSettings,
    buffers: Mutex<HashMap<String, TaskBuffer>>,
}

impl InMemoryBufferStore {
    pub fn new(settings: BufferSettings) -> Self {
        Self {
            settings,
            buffers: Mutex::new(HashMap::new()),
        }
    }

    fn prune(&self, buffers: &mut HashMap<String, TaskBuffer>) {
        let ttl = self.settings.ttl;
        buffers.retain(|_, buffer| buffer.touched.elapsed() <= ttl);
    }
}

impl Default for InMemoryBufferStore {
    fn default() -> Self {
        Self::new(BufferSettings::default())
    }
}

#[async_trait]
impl BufferStore for InMemoryBufferStore {
    async fn try_lock(&self, task_id: &TaskId) -> bool {
        let mut buffers = self.buffers.lock().await;
        let buffer = buffers
            .entry(task_id.as_str().to_string())
            .or_insert_with(TaskBuffer::new);
        match buffer.locked_at {
            Some(at) if at.elapsed() < self.settings.lock_ttl => false,
            _ => {
                buffer.locked_at = Some(Instant::now());
                true
            }
        }
    }

    async fn unlock(&self, task_id: &TaskId) {
        let mut buffers = self.buffers.lock().await;
        if let Some(buffer) = buffers.get_mut(task_id.as_str()) {
            buffer.locked_at = None;
        }
    }

    async fn append(&self, event: &StreamEvent) {
        let mut buffers = self.buffers.lock().await;
        self.prune(&mut buffers);
        let buffer = buffers
            .entry(event.task_id.as_str().to_string())
            .or_insert_with(TaskBuffer::new);
        if buffer.events.len() >= self.settings.capacity {
            buffer.events.pop_front();
        }
        buffer.events.push_back(event.clone());
        buffer.touched = Instant::now();
    }

    async fn read(&self, task_id: &TaskId) -> Vec<StreamEvent> {
        let buffers = self.buffers.lock().await;
        buffers
            .get(task_id.as_str())
            .map(|b| b.events.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(capacity: usize) -> BufferSettings {
        BufferSettings {
            capacity,
            ..Default::default()
        }
    }

    fn event(task: &str, n: usize) -> StreamEvent {
        StreamEvent::progress(TaskId::new(task), n as u8, "draft")
    }

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        let store = InMemoryBufferStore::new(settings(10));
        for n in 0..3 {
            store.append(&event("t", n)).await;
        }
        let history = store.read(&TaskId::new("t")).await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].data.progress, Some(0));
        assert_eq!(history[2].data.progress, Some(2));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = InMemoryBufferStore::new(settings(5));
        for n in 0..9 {
            store.append(&event("t", n)).await;
        }
        let history = store.read(&TaskId::new("t")).await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].data.progress, Some(4));
        assert_eq!(history[4].data.progress, Some(8));
    }

    #[tokio::test]
    async fn test_buffers_are_per_task() {
        let store = InMemoryBufferStore::new(settings(10));
        store.append(&event("a", 1)).await;
        store.append(&event("b", 2)).await;
        assert_eq!(store.read(&TaskId::new("a")).await.len(), 1);
        assert_eq!(store.read(&TaskId::new("b")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_unlocked() {
        let store = InMemoryBufferStore::default();
        let id = TaskId::new("t");
        assert!(store.try_lock(&id).await);
        assert!(!store.try_lock(&id).await);
        store.unlock(&id).await;
        assert!(store.try_lock(&id).await);
    }

    #[tokio::test]
    async fn test_expired_lock_is_stolen() {
        let store = InMemoryBufferStore::new(BufferSettings {
            lock_ttl: Duration::from_millis(0),
            ..Default::default()
        });
        let id = TaskId::new("t");
        assert!(store.try_lock(&id).await);
        // TTL zero: the previous holder is presumed dead
        assert!(store.try_lock(&id).await);
    }

    #[tokio::test]
    async fn test_idle_buffers_expire() {
        let store = InMemoryBufferStore::new(BufferSettings {
            ttl: Duration::from_millis(0),
            ..Default::default()
        });
        store.append(&event("old", 1)).await;
        // Appending elsewhere prunes idle buffers past their TTL
        store.append(&event("new", 1)).await;
        assert!(store.read(&TaskId::new("old")).await.is_empty());
    }
}
