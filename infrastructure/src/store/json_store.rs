//! JSON file task store
//!
//! One pretty-printed JSON file per task under a data directory. Writes
//! go through a temp file followed by a rename, so a crash mid-write
//! leaves the previous version intact rather than a truncated record.
//! The queue reads `pending()` once at startup to recover work.

use async_trait::async_trait;
use counsel_application::ports::task_store::{StoreError, TaskStore};
use counsel_domain::{Task, TaskId};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct JsonTaskStore {
    dir: PathBuf,
}

impl JsonTaskStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        debug!("Task store opened at {}", dir.display());
        Ok(Self { dir })
    }

    /// Default data directory: `$XDG_DATA_HOME/counsel/tasks` with a
    /// fallback to `./counsel-tasks`
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("counsel").join("tasks"))
            .unwrap_or_else(|| PathBuf::from("counsel-tasks"))
    }

    fn path_for(&self, id: &TaskId) -> PathBuf {
        // Task ids are uuids; sanitize anyway so an odd id cannot escape
        // the data directory
        let safe: String = id
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    async fn read_task(path: &Path) -> Result<Task, StoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn save(&self, task: &Task) -> Result<(), StoreError> {
        let path = self.path_for(&task.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(task)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    async fn load(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_task(&path).await.map(Some)
    }

    async fn pending(&self) -> Result<Vec<Task>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let mut tasks = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_task(&path).await {
                Ok(task) if !task.is_terminal() => tasks.push(task),
                Ok(_) => {}
                Err(e) => {
                    // One corrupt record must not block recovery of the rest
                    warn!("Skipping unreadable task record {}: {e}", path.display());
                }
            }
        }
        // Oldest first, so recovery preserves rough submission order
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::{AgentDomain, AgentInput, TaskStatus};

    fn task(id: &str) -> Task {
        Task::new(id, AgentDomain::Legal, AgentInput::new("question"))
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::open(dir.path()).await.unwrap();

        let mut t = task("t-1");
        t.start_attempt().unwrap();
        store.save(&t).await.unwrap();

        let loaded = store.load(&TaskId::new("t-1")).await.unwrap().unwrap();
        assert_eq!(loaded.id, t.id);
        assert_eq!(loaded.status, TaskStatus::Running);
        assert_eq!(loaded.attempts, 1);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::open(dir.path()).await.unwrap();
        assert!(store.load(&TaskId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::open(dir.path()).await.unwrap();

        let mut t = task("t-2");
        store.save(&t).await.unwrap();
        t.start_attempt().unwrap();
        t.complete().unwrap();
        store.save(&t).await.unwrap();

        let loaded = store.load(&TaskId::new("t-2")).await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_pending_excludes_terminal_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::open(dir.path()).await.unwrap();

        store.save(&task("t-waiting")).await.unwrap();

        let mut running = task("t-running");
        running.start_attempt().unwrap();
        store.save(&running).await.unwrap();

        let mut done = task("t-done");
        done.start_attempt().unwrap();
        done.complete().unwrap();
        store.save(&done).await.unwrap();

        let pending = store.pending().await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(pending.len(), 2);
        assert!(ids.contains(&"t-waiting"));
        assert!(ids.contains(&"t-running"));
    }

    #[tokio::test]
    async fn test_pending_skips_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::open(dir.path()).await.unwrap();

        store.save(&task("t-good")).await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), b"{not json")
            .await
            .unwrap();

        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.as_str(), "t-good");
    }

    #[tokio::test]
    async fn test_odd_ids_stay_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::open(dir.path()).await.unwrap();

        let t = task("../escape");
        store.save(&t).await.unwrap();

        let loaded = store.load(&TaskId::new("../escape")).await.unwrap();
        assert!(loaded.is_some());
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }
}
