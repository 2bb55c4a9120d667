//! Progress streaming adapters

pub mod buffer;
pub mod bus;

pub use buffer::{BufferSettings, BufferStore, InMemoryBufferStore};
pub use bus::StreamingBus;
