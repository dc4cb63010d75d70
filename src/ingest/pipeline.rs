//! Ingestion Pipeline
//!
//! Consumes the order stream one message at a time: decode, validate,
//! persist, cache, then commit the offset. Offsets are committed strictly in
//! fetch order because nothing here processes messages concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::broker::{Broker, StreamMessage};
use crate::error::BrokerError;
use crate::models::Order;
use crate::repository::OrderRepository;
use crate::validation::OrderValidator;
use crate::OrderCache;

/// Pause before retrying after a broker fetch error, to avoid a tight loop.
const FETCH_ERROR_BACKOFF: Duration = Duration::from_millis(200);

// == Outcome ==
/// Terminal state of a single message's trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Persisted, cached and acknowledged
    Stored,
    /// Unprocessable payload, acknowledged without persisting
    Discarded,
    /// Persistence failed; offset left uncommitted for redelivery
    RetryPending,
}

// == Ingestion Pipeline ==
/// The consume-validate-persist-cache-commit worker.
pub struct IngestionPipeline {
    broker: Arc<dyn Broker>,
    repo: Arc<dyn OrderRepository>,
    cache: Arc<OrderCache>,
    validator: OrderValidator,
    retry_backoff: Duration,
}

impl IngestionPipeline {
    pub fn new(
        broker: Arc<dyn Broker>,
        repo: Arc<dyn OrderRepository>,
        cache: Arc<OrderCache>,
        validator: OrderValidator,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            broker,
            repo,
            cache,
            validator,
            retry_backoff,
        }
    }

    /// Runs the consume loop until the shutdown flag flips or the stream
    /// closes.
    ///
    /// Cancellation is checked between messages: a message already fetched
    /// is processed to completion, but no new fetch starts afterwards. The
    /// broker is closed on the way out.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("ingestion pipeline started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let fetched = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // shutdown sender dropped; treat as a stop signal
                        break;
                    }
                    continue;
                }
                fetched = self.broker.fetch() => fetched,
            };

            match fetched {
                Ok(message) => {
                    let _ = self.process(&message).await;
                }
                Err(BrokerError::Closed) => {
                    info!("order stream closed");
                    break;
                }
                Err(error) => {
                    warn!(%error, "stream fetch failed");
                    sleep(FETCH_ERROR_BACKOFF).await;
                }
            }
        }

        self.broker.close().await;
        info!("ingestion pipeline stopped");
    }

    /// Drives one message through the state machine.
    pub(crate) async fn process(&self, message: &StreamMessage) -> Outcome {
        let order: Order = match serde_json::from_slice(&message.payload) {
            Ok(order) => order,
            Err(error) => {
                warn!(
                    offset = message.offset,
                    %error,
                    "discarding undecodable payload"
                );
                self.acknowledge(message, "decode").await;
                return Outcome::Discarded;
            }
        };

        if let Err(error) = self.validator.validate(&order) {
            warn!(
                order_uid = %order.order_uid,
                offset = message.offset,
                %error,
                "discarding invalid order"
            );
            self.acknowledge(message, "validate").await;
            return Outcome::Discarded;
        }

        if let Err(error) = self.repo.save_order(&order).await {
            error!(
                order_uid = %order.order_uid,
                offset = message.offset,
                %error,
                "persist failed, leaving offset uncommitted"
            );
            sleep(self.retry_backoff).await;
            return Outcome::RetryPending;
        }

        // the cache is touched only after the write is durable, so a crash
        // here can leave the store ahead of the cache but never behind it
        let order_uid = order.order_uid.clone();
        self.cache.set(&order_uid, Arc::new(order));
        debug!(order_uid = %order_uid, offset = message.offset, "order stored and cached");

        self.acknowledge(message, "commit").await;
        Outcome::Stored
    }

    /// Commits the offset; failure is logged but not fatal, since the
    /// message was durably processed and reprocessing is idempotent.
    async fn acknowledge(&self, message: &StreamMessage, stage: &str) {
        if let Err(error) = self.broker.commit(message).await {
            warn!(offset = message.offset, stage, %error, "offset commit failed");
        }
    }
}
