//! Task persistence configuration from TOML (`[store]` section)
//!
//! ```toml
//! [store]
//! data_dir = "~/.local/share/counsel/tasks"
//! ```

use crate::store::JsonTaskStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Where task records live; platform data dir when absent
    pub data_dir: Option<PathBuf>,
}

impl FileStoreConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(JsonTaskStore::default_dir)
    }
}
