//! Orderflow - order ingestion and lookup service
//!
//! Consumes order payloads from a message stream, persists them to
//! PostgreSQL, and serves lookups by order uid through a sharded in-memory
//! LRU+TTL cache.

pub mod api;
pub mod bootstrap;
pub mod broker;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod repository;
pub mod service;
pub mod validation;

/// The cache instantiation shared by the pipeline and the lookup path:
/// orders are stored behind `Arc` so a read clones a pointer, not the record.
pub type OrderCache = cache::ShardedCache<std::sync::Arc<models::Order>>;

pub use api::AppState;
pub use config::Config;
pub use service::OrderService;
