//! Infrastructure layer for counsel
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod context;
pub mod gateway;
pub mod guard;
pub mod store;
pub mod streaming;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileBackendConfig, FileBackendsConfig, FileConfig, FileContextConfig,
    FileCouncilConfig, FileGuardConfig, FileQueueConfig, FileStoreConfig, FileStreamingConfig,
};
pub use context::{
    CachedContextProvider, HttpContextProvider, HttpResearchProvider, InMemoryQueryCache, cache_key,
};
pub use gateway::{CircuitBreaker, CircuitBreakerSettings, HttpModelGateway, http::BackendEndpoint};
pub use guard::{RegexPiiGuard, SanitizingResponseCleaner};
pub use store::JsonTaskStore;
pub use streaming::{BufferSettings, BufferStore, InMemoryBufferStore, StreamingBus};
