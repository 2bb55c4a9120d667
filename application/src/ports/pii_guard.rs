//! PII Guard port
//!
//! Anonymizes caller-identifying data before prompts leave the system and
//! restores it before results are returned. Mappings must be applied in
//! reverse order of creation on restore to handle nested substitutions.

/// One substitution performed during sanitization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiMapping {
    pub original: String,
    pub placeholder: String,
}

/// Result of sanitizing a text
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub text: String,
    /// In creation order; restore walks this in reverse
    pub mappings: Vec<PiiMapping>,
}

/// Reversible anonymization of identifying text
pub trait PiiGuard: Send + Sync {
    /// Replace the given identifiers (and well-known PII patterns) with
    /// placeholders.
    fn sanitize(&self, text: &str, identifiers: &[String]) -> Sanitized;

    /// Undo the reversible substitutions of a previous `sanitize` call.
    fn restore(&self, text: &str, mappings: &[PiiMapping]) -> String;
}

/// Guard that passes text through untouched
pub struct NoPiiGuard;

impl PiiGuard for NoPiiGuard {
    fn sanitize(&self, text: &str, _identifiers: &[String]) -> Sanitized {
        Sanitized {
            text: text.to_string(),
            mappings: Vec::new(),
        }
    }

    fn restore(&self, text: &str, _mappings: &[PiiMapping]) -> String {
        text.to_string()
    }
}
