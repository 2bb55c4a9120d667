//! Configuration loading

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileBackendConfig, FileBackendsConfig, FileConfig, FileContextConfig, FileCouncilConfig,
    FileGuardConfig, FileQueueConfig, FileStoreConfig, FileStreamingConfig,
};
pub use loader::ConfigLoader;
