//! Context retrieval adapters

pub mod cache;
pub mod research;
pub mod retrieval;

pub use cache::{InMemoryQueryCache, cache_key};
pub use research::HttpResearchProvider;
pub use retrieval::{CachedContextProvider, HttpContextProvider};
