//! Order Lookup Service
//!
//! The cache-aside read path consumed by the HTTP layer: check the cache,
//! fall back to the repository, populate the cache with what the repository
//! returned.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{RepositoryError, ServiceError};
use crate::models::Order;
use crate::repository::OrderRepository;
use crate::OrderCache;

// == Order Service ==
/// Serves point lookups by order uid.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    cache: Arc<OrderCache>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, cache: Arc<OrderCache>) -> Self {
        Self { repo, cache }
    }

    /// Looks up one order, cache first.
    ///
    /// A miss reads the repository and populates the cache with the result.
    /// Failures are never cached, so a retry can succeed once the store
    /// recovers or the order appears. Concurrent misses for the same key may
    /// each read the repository; the reads are idempotent and the cache
    /// converges on the same value either way.
    pub async fn get_order(&self, order_uid: &str) -> Result<Arc<Order>, ServiceError> {
        if let Some(order) = self.cache.get(order_uid) {
            debug!(order_uid, "order served from cache");
            return Ok(order);
        }

        match self.repo.get_order(order_uid).await {
            Ok(order) => {
                let order = Arc::new(order);
                self.cache.set(order_uid, Arc::clone(&order));
                debug!(order_uid, "order served from repository");
                Ok(order)
            }
            Err(RepositoryError::NotFound(_)) => Err(ServiceError::NotFound(order_uid.to_string())),
            Err(error) => {
                error!(order_uid, %error, "repository read failed");
                Err(ServiceError::Unavailable(error.to_string()))
            }
        }
    }
}
