//! Response sanitizer
//!
//! Model output arrives with artifacts that should never reach the
//! caller: `<think>` reasoning blocks, a code fence wrapped around the
//! whole answer, and the occasional echoed instruction-override line.
//! The first two are stripped, injection lines are masked with
//! `[FILTERED]`, and whitespace is normalized.

use counsel_application::ports::response_cleaner::ResponseCleaner;
use regex::Regex;

pub struct SanitizingResponseCleaner {
    think_block: Regex,
    injection_line: Regex,
}

impl Default for SanitizingResponseCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl SanitizingResponseCleaner {
    pub fn new() -> Self {
        Self {
            think_block: Regex::new(r"(?si)<think>.*?</think>").expect("static think pattern"),
            injection_line: Regex::new(
                r"(?mi)^.*(ignore (all )?(previous|prior) instructions|disregard (all )?(previous|prior) instructions).*$",
            )
            .expect("static injection pattern"),
        }
    }

    /// Unwrap a code fence only when it encloses the entire response
    fn unwrap_outer_fence(text: &str) -> &str {
        let trimmed = text.trim();
        if !trimmed.starts_with("```") || !trimmed.ends_with("```") {
            return trimmed;
        }
        let Some(first_newline) = trimmed.find('\n') else {
            return trimmed;
        };
        let inner = &trimmed[first_newline + 1..trimmed.len() - 3];
        // A fence that closes and reopens mid-text is not an outer wrapper
        if inner.contains("```") {
            return trimmed;
        }
        inner.trim()
    }
}

impl ResponseCleaner for SanitizingResponseCleaner {
    fn clean(&self, text: &str) -> String {
        let without_thinking = self.think_block.replace_all(text, "");
        let without_injections = self
            .injection_line
            .replace_all(&without_thinking, "[FILTERED]");
        let unwrapped = Self::unwrap_outer_fence(&without_injections);

        // Collapse runs of 3+ newlines left behind by the removals
        let mut out = String::with_capacity(unwrapped.len());
        let mut blank_run = 0usize;
        for line in unwrapped.lines() {
            if line.trim().is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(line);
            out.push('\n');
        }
        out.trim().to_string()
    }
}
