//! Ingestion Module
//!
//! The stream consumer that turns raw order payloads into durable, cached
//! records.

mod pipeline;

pub use pipeline::{IngestionPipeline, Outcome};
