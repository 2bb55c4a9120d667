//! Model gateway adapters

pub mod circuit;
pub mod http;

pub use circuit::{CircuitBreaker, CircuitBreakerSettings};
pub use http::HttpModelGateway;
