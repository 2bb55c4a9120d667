//! Response cleaning port
//!
//! Strips residual formatting artifacts (markdown, model thinking tags,
//! prompt-injection echoes) from draft content before it is finalized.

/// Cleans model output for final presentation
pub trait ResponseCleaner: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

/// Cleaner that passes text through untouched
pub struct NoClean;

impl ResponseCleaner for NoClean {
    fn clean(&self, text: &str) -> String {
        text.to_string()
    }
}
