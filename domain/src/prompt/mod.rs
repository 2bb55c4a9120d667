//! Prompt templates for council phases and advisory domains

pub mod advisor;
pub mod council;

pub use advisor::AdvisorPrompt;
pub use council::CouncilPrompt;
