//! PII guard configuration from TOML (`[guard]` section)
//!
//! ```toml
//! [guard]
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGuardConfig {
    /// Disable to pass text through unsanitized (testing only)
    pub enabled: bool,
}

impl Default for FileGuardConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
