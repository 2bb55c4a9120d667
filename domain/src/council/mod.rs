//! Council protocol: anonymized multi-model generate → critique → consensus
//!
//! The types here are pure — no I/O. The application layer drives the
//! actual backend calls and feeds results through [`Panel`] and
//! [`scoring::score_consensus`].

pub mod entities;
pub mod panel;
pub mod parsing;
pub mod scoring;
