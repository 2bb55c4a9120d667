//! Advisory agent domain: per-task pipeline entities

pub mod entities;
pub mod task;
