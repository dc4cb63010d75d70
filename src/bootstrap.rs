//! Cache Hydration
//!
//! One-shot startup routine that warms the cache from the repository before
//! the service accepts traffic.

use std::sync::Arc;

use tracing::info;

use crate::error::RepositoryError;
use crate::repository::OrderRepository;
use crate::OrderCache;

/// Loads every persisted order into the cache.
///
/// Returns the number of orders loaded. A failure here must abort startup:
/// serving with an unknown cache/store relationship is worse than not
/// starting. Safe to call again; a re-run only refreshes entries.
pub async fn restore_cache(
    repo: &dyn OrderRepository,
    cache: &OrderCache,
) -> Result<usize, RepositoryError> {
    let orders = repo.list_orders().await?;
    let count = orders.len();

    for order in orders {
        let order_uid = order.order_uid.clone();
        cache.set(&order_uid, Arc::new(order));
    }

    info!(orders = count, "cache hydrated from repository");
    Ok(count)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::cache::ShardedCache;
    use crate::models::{test_order, Order};

    struct FixedRepository {
        orders: Vec<Order>,
        fail: bool,
    }

    #[async_trait]
    impl OrderRepository for FixedRepository {
        async fn save_order(&self, _order: &Order) -> Result<(), RepositoryError> {
            unreachable!("hydration never writes to the repository")
        }

        async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError> {
            Err(RepositoryError::NotFound(order_uid.to_string()))
        }

        async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Unavailable("store down".into()));
            }
            Ok(self.orders.clone())
        }
    }

    #[tokio::test]
    async fn test_restore_populates_cache() {
        let repo = FixedRepository {
            orders: vec![test_order("uid-1"), test_order("uid-2")],
            fail: false,
        };
        let cache = ShardedCache::new(4, 64, Duration::from_secs(3600));

        let count = restore_cache(&repo, &cache).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("uid-1").is_some());
        assert!(cache.get("uid-2").is_some());
    }

    #[tokio::test]
    async fn test_restore_failure_propagates() {
        let repo = FixedRepository {
            orders: vec![],
            fail: true,
        };
        let cache = ShardedCache::new(4, 64, Duration::from_secs(3600));

        assert!(restore_cache(&repo, &cache).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_restore_is_idempotent() {
        let repo = FixedRepository {
            orders: vec![test_order("uid-1")],
            fail: false,
        };
        let cache = ShardedCache::new(4, 64, Duration::from_secs(3600));

        restore_cache(&repo, &cache).await.unwrap();
        restore_cache(&repo, &cache).await.unwrap();

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_empty_store_leaves_cache_empty() {
        let repo = FixedRepository {
            orders: vec![],
            fail: false,
        };
        let cache = ShardedCache::new(4, 64, Duration::from_secs(3600));

        let count = restore_cache(&repo, &cache).await.unwrap();
        assert_eq!(count, 0);
        assert!(cache.is_empty());
    }
}
