//! Address change indexer.
//!
//! Replays the event store through the address change projection and writes
//! the emitted facts to a [`FactSink`](fact_store::FactSink) in batches,
//! resuming after the highest sequence number already stored.

pub mod buffer;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod shutdown;

pub use buffer::BatchBuffer;
pub use config::{Config, ConfigError, LogFormat};
pub use error::{IndexerError, Result};
pub use pipeline::{IndexerPipeline, PipelineSettings};
pub use shutdown::Shutdown;
