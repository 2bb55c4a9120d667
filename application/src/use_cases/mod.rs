//! Use cases orchestrating the advisory pipeline

pub mod advisors;
pub mod orchestrator;
pub mod run_council;
pub mod run_pipeline;
