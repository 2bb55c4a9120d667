//! Outbound/inbound text guards

pub mod pii;
pub mod response;

pub use pii::RegexPiiGuard;
pub use response::SanitizingResponseCleaner;
