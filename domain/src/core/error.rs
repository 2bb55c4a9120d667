//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown agent domain: {0}")]
    UnknownAgentDomain(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_domain_display() {
        let error = DomainError::UnknownAgentDomain("astrology".into());
        assert_eq!(error.to_string(), "Unknown agent domain: astrology");
    }
}
