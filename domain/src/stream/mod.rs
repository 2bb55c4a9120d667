//! Progress stream events
//!
//! [`StreamEvent`] is the unit delivered to SSE-style subscribers: typed,
//! timestamped, and causally ordered by publish time for a given task.
//! Delivery to any one subscriber is best-effort.

use crate::agent::task::TaskId;
use serde::{Deserialize, Serialize};

/// Kind of progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamEventKind {
    Progress,
    Chunk,
    Thinking,
    Done,
    Error,
}

impl StreamEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            StreamEventKind::Progress => "progress",
            StreamEventKind::Chunk => "chunk",
            StreamEventKind::Thinking => "thinking",
            StreamEventKind::Done => "done",
            StreamEventKind::Error => "error",
        }
    }

    /// Terminal events end the stream for their task
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEventKind::Done | StreamEventKind::Error)
    }
}

impl std::fmt::Display for StreamEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Free-form payload carried by a stream event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamData {
    /// Text content (chunks or messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Current pipeline phase name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Progress percentage, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Agent identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Thinking step description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Final result payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// A progress notification for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: StreamEventKind,
    pub task_id: TaskId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub data: StreamData,
}

impl StreamEvent {
    pub fn new(kind: StreamEventKind, task_id: TaskId, data: StreamData) -> Self {
        Self {
            kind,
            task_id,
            timestamp: chrono::Utc::now(),
            data,
        }
    }

    pub fn progress(task_id: TaskId, progress: u8, phase: impl Into<String>) -> Self {
        Self::new(
            StreamEventKind::Progress,
            task_id,
            StreamData {
                progress: Some(progress.min(100)),
                phase: Some(phase.into()),
                ..Default::default()
            },
        )
    }

    pub fn chunk(task_id: TaskId, content: impl Into<String>, agent: impl Into<String>) -> Self {
        Self::new(
            StreamEventKind::Chunk,
            task_id,
            StreamData {
                content: Some(content.into()),
                agent: Some(agent.into()),
                ..Default::default()
            },
        )
    }

    pub fn thinking(task_id: TaskId, step: impl Into<String>, agent: impl Into<String>) -> Self {
        Self::new(
            StreamEventKind::Thinking,
            task_id,
            StreamData {
                step: Some(step.into()),
                agent: Some(agent.into()),
                ..Default::default()
            },
        )
    }

    pub fn done(task_id: TaskId, result: serde_json::Value) -> Self {
        Self::new(
            StreamEventKind::Done,
            task_id,
            StreamData {
                result: Some(result),
                ..Default::default()
            },
        )
    }

    pub fn error(task_id: TaskId, message: impl Into<String>) -> Self {
        Self::new(
            StreamEventKind::Error,
            task_id,
            StreamData {
                error: Some(message.into()),
                ..Default::default()
            },
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_kinds() {
        assert!(StreamEventKind::Done.is_terminal());
        assert!(StreamEventKind::Error.is_terminal());
        assert!(!StreamEventKind::Progress.is_terminal());
        assert!(!StreamEventKind::Chunk.is_terminal());
        assert!(!StreamEventKind::Thinking.is_terminal());
    }

    #[test]
    fn test_progress_capped_at_100() {
        let event = StreamEvent::progress(TaskId::new("t"), 250, "draft");
        assert_eq!(event.data.progress, Some(100));
    }

    #[test]
    fn test_serializes_with_type_field() {
        let event = StreamEvent::error(TaskId::new("t-9"), "boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["task_id"], "t-9");
        assert_eq!(json["data"]["error"], "boom");
        // Unset payload fields are omitted entirely
        assert!(json["data"].get("content").is_none());
    }
}
