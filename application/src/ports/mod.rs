//! Ports (interfaces) between the application layer and the outside world
//!
//! One trait per file. Implementations (adapters) live in the
//! infrastructure layer and are injected at wiring time.

pub mod context_provider;
pub mod event_bus;
pub mod model_gateway;
pub mod pii_guard;
pub mod query_cache;
pub mod response_cleaner;
pub mod task_store;
