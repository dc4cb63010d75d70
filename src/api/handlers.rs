//! API Handlers
//!
//! HTTP request handlers for each order service endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::broker::StreamPublisher;
use crate::error::ServiceError;
use crate::models::{HealthResponse, IngestResponse, Order, StatsResponse};
use crate::service::OrderService;
use crate::OrderCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside lookup path
    pub service: Arc<OrderService>,
    /// Shared cache, for the stats endpoint
    pub cache: Arc<OrderCache>,
    /// Producer handle feeding the ingestion stream
    pub publisher: StreamPublisher,
}

impl AppState {
    /// Creates a new AppState from the service collaborators.
    pub fn new(
        service: Arc<OrderService>,
        cache: Arc<OrderCache>,
        publisher: StreamPublisher,
    ) -> Self {
        Self {
            service,
            cache,
            publisher,
        }
    }
}

/// Handler for GET /order/:order_uid
///
/// Looks up one order, serving from the cache when possible.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>, ServiceError> {
    let order = state.service.get_order(&order_uid).await?;
    Ok(Json(Order::clone(&order)))
}

/// Handler for POST /order
///
/// Enqueues a raw order payload onto the ingestion stream. The payload is
/// decoded and validated by the pipeline, not here, so acceptance only means
/// the message entered the stream.
pub async fn ingest_order_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestResponse>), ServiceError> {
    match state.publisher.publish(body.to_vec()).await {
        Ok(offset) => Ok((StatusCode::ACCEPTED, Json(IngestResponse::accepted(offset)))),
        Err(error) => {
            warn!(%error, "order stream rejected payload");
            Err(ServiceError::Unavailable("order stream is closed".to_string()))
        }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.cache.stats();
    let entries = state.cache.len();
    Json(StatsResponse::new(snapshot, entries))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::broker::MemoryBroker;
    use crate::cache::ShardedCache;
    use crate::error::RepositoryError;
    use crate::models::test_order;
    use crate::repository::OrderRepository;

    struct EmptyRepository;

    #[async_trait]
    impl OrderRepository for EmptyRepository {
        async fn save_order(&self, _order: &Order) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError> {
            Err(RepositoryError::NotFound(order_uid.to_string()))
        }

        async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
            Ok(vec![])
        }
    }

    fn test_state() -> (AppState, MemoryBroker) {
        let cache = Arc::new(ShardedCache::new(4, 64, Duration::from_secs(3600)));
        let repo = Arc::new(EmptyRepository);
        let service = Arc::new(OrderService::new(repo, Arc::clone(&cache)));
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_secs(60));
        (AppState::new(service, cache, publisher), broker)
    }

    #[tokio::test]
    async fn test_get_order_hits_cache() {
        let (state, _broker) = test_state();
        let order = test_order("uid-1");
        state.cache.set("uid-1", Arc::new(order.clone()));

        let result = get_order_handler(State(state), Path("uid-1".to_string())).await;
        assert_eq!(result.unwrap().0, order);
    }

    #[tokio::test]
    async fn test_get_missing_order_fails() {
        let (state, _broker) = test_state();

        let result = get_order_handler(State(state), Path("ghost".to_string())).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ingest_accepts_payload() {
        let (state, _broker) = test_state();

        let result =
            ingest_order_handler(State(state), Bytes::from_static(b"{\"anything\":1}")).await;
        let (status, body) = result.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.offset, 0);
    }

    #[tokio::test]
    async fn test_stats_reflect_cache_reads() {
        let (state, _broker) = test_state();
        state.cache.set("uid-1", Arc::new(test_order("uid-1")));
        let _ = state.cache.get("uid-1");
        let _ = state.cache.get("absent");

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
