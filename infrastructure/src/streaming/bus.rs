//! Streaming event bus
//!
//! Couples a live broadcast channel per task with the replay buffer:
//! subscribers receive the buffered history first, then live events,
//! and the stream ends after a terminal `done`/`error` event.
//!
//! Publishing never fails outward. Lock contention on the buffer is
//! retried a bounded number of times, then the append happens without
//! the lock; losing ordering beats losing the event. Delivery is
//! at-least-once: a subscriber arriving exactly as an event is published
//! can see it in both the replay and the live feed.

use crate::streaming::buffer::{BufferSettings, BufferStore};
use async_trait::async_trait;
use counsel_application::ports::event_bus::EventBus;
use counsel_domain::{StreamEvent, TaskId};
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

const LIVE_CHANNEL_CAPACITY: usize = 256;

pub struct StreamingBus {
    buffer: Arc<dyn BufferStore>,
    settings: BufferSettings,
    channels: Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>,
}

impl StreamingBus {
    pub fn new(buffer: Arc<dyn BufferStore>, settings: BufferSettings) -> Self {
        Self {
            buffer,
            settings,
            channels: Mutex::new(HashMap::new()),
        }
    }

    async fn sender_for(&self, task_id: &TaskId) -> broadcast::Sender<StreamEvent> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(task_id.as_str().to_string())
            .or_insert_with(|| broadcast::channel(LIVE_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Append under the advisory lock, falling back to an unlocked append
    /// once the retry budget is spent
    async fn buffered_append(&self, event: &StreamEvent) {
        let mut locked = false;
        for _ in 0..self.settings.lock_attempts {
            if self.buffer.try_lock(&event.task_id).await {
                locked = true;
                break;
            }
            tokio::time::sleep(self.settings.lock_retry_delay).await;
        }
        if !locked {
            warn!(
                task_id = %event.task_id,
                "Buffer lock not acquired after {} attempts, appending unlocked",
                self.settings.lock_attempts
            );
        }

        self.buffer.append(event).await;

        if locked {
            self.buffer.unlock(&event.task_id).await;
        }
    }
}

#[async_trait]
impl EventBus for StreamingBus {
    async fn publish(&self, event: StreamEvent) {
        self.buffered_append(&event).await;

        let sender = self.sender_for(&event.task_id).await;
        // No live subscribers is normal; the buffer has the event
        let _ = sender.send(event.clone());

        if event.is_terminal() {
            debug!(task_id = %event.task_id, kind = %event.kind, "Stream closed");
            let mut channels = self.channels.lock().await;
            channels.remove(event.task_id.as_str());
        }
    }

    async fn subscribe(&self, task_id: &TaskId) -> BoxStream<'static, StreamEvent> {
        // Subscribe to live events before reading history, so nothing
        // published in between is lost
        let mut live = self.sender_for(task_id).await.subscribe();
        let history = self.buffer.read(task_id).await;

        let already_done = history.iter().any(StreamEvent::is_terminal);
        let (tx, rx) = mpsc::channel(LIVE_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            for event in history {
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() {
                    return;
                }
                if terminal {
                    return;
                }
            }
            if already_done {
                return;
            }
            loop {
                match live.recv().await {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        if tx.send(event).await.is_err() {
                            return;
                        }
                        if terminal {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Subscriber lagged, skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::buffer::InMemoryBufferStore;
    use futures::StreamExt;
    use std::time::Duration;

    fn bus() -> StreamingBus {
        bus_with(BufferSettings::default())
    }

    fn bus_with(settings: BufferSettings) -> StreamingBus {
        StreamingBus::new(
            Arc::new(InMemoryBufferStore::new(settings.clone())),
            settings,
        )
    }

    fn progress(task: &str, n: u8) -> StreamEvent {
        StreamEvent::progress(TaskId::new(task), n, "draft")
    }

    async fn collect_all(mut stream: BoxStream<'static, StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_replay_then_live_until_terminal() {
        let bus = bus();
        let id = TaskId::new("t");

        bus.publish(progress("t", 10)).await;
        bus.publish(progress("t", 55)).await;

        let stream = bus.subscribe(&id).await;
        bus.publish(StreamEvent::done(id.clone(), serde_json::json!({"ok": true})))
            .await;

        let events = collect_all(stream).await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data.progress, Some(10));
        assert_eq!(events[1].data.progress, Some(55));
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_history_and_stream_ends() {
        let bus = bus();
        let id = TaskId::new("t");

        bus.publish(progress("t", 10)).await;
        bus.publish(StreamEvent::error(id.clone(), "backend trouble"))
            .await;

        // Subscribing after the terminal event: replay only, then EOF
        let events = collect_all(bus.subscribe(&id).await).await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_get_live_events() {
        let bus = Arc::new(bus());
        let id = TaskId::new("t");

        let s1 = bus.subscribe(&id).await;
        let s2 = bus.subscribe(&id).await;

        bus.publish(progress("t", 30)).await;
        bus.publish(StreamEvent::done(id.clone(), serde_json::Value::Null))
            .await;

        let e1 = collect_all(s1).await;
        let e2 = collect_all(s2).await;
        assert_eq!(e1.len(), 2);
        assert_eq!(e2.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_publishers_respect_buffer_cap() {
        let settings = BufferSettings {
            capacity: 100,
            lock_retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let store = Arc::new(InMemoryBufferStore::new(settings.clone()));
        let bus = Arc::new(StreamingBus::new(
            Arc::clone(&store) as Arc<dyn BufferStore>,
            settings,
        ));

        let mut handles = Vec::new();
        for p in 0..8u8 {
            let bus = Arc::clone(&bus);
            handles.push(tokio::spawn(async move {
                for n in 0..30u8 {
                    bus.publish(progress("t", p.wrapping_mul(30).wrapping_add(n)))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let history = store.read(&TaskId::new("t")).await;
        assert_eq!(history.len(), 100);
    }

    #[tokio::test]
    async fn test_publish_survives_permanently_locked_buffer() {
        struct StubbornStore(InMemoryBufferStore);

        #[async_trait]
        impl BufferStore for StubbornStore {
            async fn try_lock(&self, _task_id: &TaskId) -> bool {
                false
            }
            async fn unlock(&self, task_id: &TaskId) {
                self.0.unlock(task_id).await;
            }
            async fn append(&self, event: &StreamEvent) {
                self.0.append(event).await;
            }
            async fn read(&self, task_id: &TaskId) -> Vec<StreamEvent> {
                self.0.read(task_id).await
            }
        }

        let store = Arc::new(StubbornStore(InMemoryBufferStore::default()));
        let bus = StreamingBus::new(
            Arc::clone(&store) as Arc<dyn BufferStore>,
            BufferSettings {
                lock_attempts: 3,
                lock_retry_delay: Duration::from_millis(1),
                ..Default::default()
            },
        );

        bus.publish(progress("t", 42)).await;
        let history = store.read(&TaskId::new("t")).await;
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_events_for_other_tasks_are_not_delivered() {
        let bus = bus();
        let id = TaskId::new("mine");

        let stream = bus.subscribe(&id).await;
        bus.publish(progress("other", 10)).await;
        bus.publish(StreamEvent::done(id.clone(), serde_json::Value::Null))
            .await;

        let events = collect_all(stream).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }
}
