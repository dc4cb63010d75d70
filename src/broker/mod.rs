//! Broker Module
//!
//! The message stream contract the ingestion pipeline consumes, and the
//! in-process implementation used to run the service.

mod memory;

pub use memory::{MemoryBroker, StreamPublisher};

use async_trait::async_trait;

use crate::error::BrokerError;

// == Stream Message ==
/// A delivered-but-not-yet-acknowledged unit of the order stream.
///
/// The broker owns the message until [`Broker::commit`] retires its offset;
/// a crash before commit means the same payload is delivered again, so
/// downstream processing must be idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Monotonically increasing position in the stream
    pub offset: u64,
    /// Raw order payload as produced upstream
    pub payload: Vec<u8>,
}

// == Broker ==
/// At-least-once message stream contract.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Blocks until the next message is available.
    ///
    /// The returned future must be cancel-safe: dropping it mid-wait (e.g.
    /// when a shutdown branch wins a `select!`) loses no message.
    async fn fetch(&self) -> Result<StreamMessage, BrokerError>;

    /// Acknowledges a message so it is never delivered again.
    async fn commit(&self, message: &StreamMessage) -> Result<(), BrokerError>;

    /// Releases the underlying stream; called once when consumption stops.
    async fn close(&self);
}
