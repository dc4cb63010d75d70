//! Orderflow - order ingestion and lookup service
//!
//! Wires the service together: PostgreSQL repository, sharded cache,
//! in-process order stream, ingestion pipeline and HTTP read API.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Connect the PostgreSQL repository and verify reachability
//! 4. Create the sharded cache and hydrate it from the repository
//! 5. Spawn the ingestion pipeline on the order stream
//! 6. Start the HTTP server on the configured port
//! 7. Handle graceful shutdown on SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderflow::api::{create_router, AppState};
use orderflow::bootstrap::restore_cache;
use orderflow::broker::MemoryBroker;
use orderflow::cache::ShardedCache;
use orderflow::config::Config;
use orderflow::ingest::IngestionPipeline;
use orderflow::repository::PgOrderRepository;
use orderflow::service::OrderService;
use orderflow::validation::OrderValidator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderflow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Orderflow");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_capacity={}, cache_shards={}, cache_ttl={:?}, port={}",
        config.cache_capacity, config.cache_shards, config.cache_ttl, config.server_port
    );

    // Repository; reachability is verified before anything depends on it
    let repo = Arc::new(
        PgOrderRepository::connect(&config).context("failed to configure PostgreSQL pool")?,
    );
    repo.ping().await.context("PostgreSQL is unreachable")?;
    info!("Repository connected");

    // Cache, hydrated before the service accepts traffic
    let cache = Arc::new(ShardedCache::new(
        config.cache_shards,
        config.cache_capacity,
        config.cache_ttl,
    ));
    let restored = restore_cache(repo.as_ref(), &cache)
        .await
        .context("cache hydration failed")?;
    info!("Cache hydrated with {} orders", restored);

    // Order stream and ingestion pipeline
    let (broker, publisher) =
        MemoryBroker::channel(config.stream_capacity, config.stream_redelivery_delay);
    let pipeline = IngestionPipeline::new(
        Arc::new(broker),
        repo.clone(),
        cache.clone(),
        OrderValidator::new(),
        config.ingest_retry_backoff,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline_handle = tokio::spawn(pipeline.run(shutdown_rx));
    info!("Ingestion pipeline started");

    // Lookup service and HTTP router
    let service = Arc::new(OrderService::new(repo, cache.clone()));
    let app = create_router(AppState::new(service, cache, publisher));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Listener is down; stop the pipeline and give in-flight work a deadline
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(config.shutdown_timeout, pipeline_handle).await {
        Ok(_) => info!("Ingestion pipeline drained"),
        Err(_) => warn!(
            "Ingestion pipeline did not stop within {:?}, abandoning it",
            config.shutdown_timeout
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
