//! Repository Module
//!
//! The persistence contract consumed by the pipeline, hydrator and lookup
//! service, plus its PostgreSQL implementation.

mod postgres;

pub use postgres::PgOrderRepository;

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::models::Order;

// == Order Repository ==
/// Narrow persistence contract for orders.
///
/// Implementations must make `save_order` an idempotent upsert, atomic
/// across the order's constituent records, so broker redelivery converges
/// on the same stored state.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists an order, replacing any previous version under the same uid.
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Loads one order by uid; `NotFound` when no such row exists.
    async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError>;

    /// Loads every persisted order; used once at startup to warm the cache.
    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError>;
}
