//! Core domain types shared across modules

pub mod backend;
pub mod error;
