//! Domain layer for counsel
//!
//! This crate contains the core business logic, entities, and value objects
//! of the multi-model advisory pipeline. It has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council run fans one prompt out to several independent model backends,
//! anonymizes their responses, has every participant critique the others,
//! scores consensus, and synthesizes a single vetted answer.
//!
//! ## Advisory Pipeline
//!
//! Each task moves through three strictly ordered phases per advisory
//! domain (legal / finance / investor / competitor):
//!
//! - **Draft**: council-backed generation
//! - **Critique**: deterministic bookkeeping over the council critiques
//! - **Final**: sanitization and de-anonymization of the draft

pub mod agent;
pub mod core;
pub mod council;
pub mod prompt;
pub mod stream;

// Re-export commonly used types
pub use agent::{
    entities::{AgentDomain, AgentInput, AgentOutput, Phase, PhaseResult},
    task::{Task, TaskError, TaskId, TaskStatus},
};
pub use core::{
    backend::{BackendId, Provider},
    error::DomainError,
};
pub use council::{
    entities::{Consensus, CouncilResponse, CouncilRun, CouncilRunMetadata, Critique},
    panel::Panel,
    parsing::parse_critique_score,
    scoring::{NEUTRAL_SCORE, score_consensus},
};
pub use prompt::{AdvisorPrompt, CouncilPrompt};
pub use stream::{StreamData, StreamEvent, StreamEventKind};
