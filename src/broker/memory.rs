//! In-Process Broker
//!
//! A bounded in-memory order stream with at-least-once delivery. Fetched
//! messages stay tracked until committed; anything left uncommitted past the
//! redelivery delay is handed out again, which is what makes retry-by-
//! redelivery work without a network broker behind the trait.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

use crate::broker::{Broker, StreamMessage};
use crate::error::BrokerError;

/// How often a blocked fetch re-checks for redelivery-due messages.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// == Stream Publisher ==
/// Producer handle for the in-process stream.
///
/// Cheap to clone; every clone feeds the same stream and offsets stay
/// globally ordered.
#[derive(Debug, Clone)]
pub struct StreamPublisher {
    tx: mpsc::Sender<StreamMessage>,
    next_offset: Arc<AtomicU64>,
}

impl StreamPublisher {
    /// Enqueues a payload, waiting when the stream is at capacity.
    ///
    /// Returns the offset assigned to the message.
    pub async fn publish(&self, payload: Vec<u8>) -> Result<u64, BrokerError> {
        let offset = self.next_offset.fetch_add(1, Ordering::Relaxed);
        self.tx
            .send(StreamMessage { offset, payload })
            .await
            .map_err(|_| BrokerError::Closed)?;
        Ok(offset)
    }
}

// == Memory Broker ==
/// Consumer side of the in-process stream.
struct InFlight {
    message: StreamMessage,
    delivered_at: Instant,
}

pub struct MemoryBroker {
    rx: tokio::sync::Mutex<mpsc::Receiver<StreamMessage>>,
    in_flight: Mutex<VecDeque<InFlight>>,
    redelivery_delay: Duration,
}

impl MemoryBroker {
    /// Creates a bounded stream, returning the consumer and producer halves.
    pub fn channel(capacity: usize, redelivery_delay: Duration) -> (Self, StreamPublisher) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let broker = Self {
            rx: tokio::sync::Mutex::new(rx),
            in_flight: Mutex::new(VecDeque::new()),
            redelivery_delay,
        };
        let publisher = StreamPublisher {
            tx,
            next_offset: Arc::new(AtomicU64::new(0)),
        };
        (broker, publisher)
    }

    fn in_flight_lock(&self) -> MutexGuard<'_, VecDeque<InFlight>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Re-delivers the oldest uncommitted message whose delay has elapsed.
    fn due_redelivery(&self) -> Option<StreamMessage> {
        let mut in_flight = self.in_flight_lock();
        for entry in in_flight.iter_mut() {
            if entry.delivered_at.elapsed() >= self.redelivery_delay {
                entry.delivered_at = Instant::now();
                debug!(offset = entry.message.offset, "redelivering uncommitted message");
                return Some(entry.message.clone());
            }
        }
        None
    }

    fn track(&self, message: StreamMessage) {
        self.in_flight_lock().push_back(InFlight {
            message,
            delivered_at: Instant::now(),
        });
    }

    fn has_in_flight(&self) -> bool {
        !self.in_flight_lock().is_empty()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn fetch(&self) -> Result<StreamMessage, BrokerError> {
        loop {
            if let Some(message) = self.due_redelivery() {
                return Ok(message);
            }

            let mut rx = self.rx.lock().await;
            match timeout(POLL_INTERVAL, rx.recv()).await {
                Ok(Some(message)) => {
                    self.track(message.clone());
                    return Ok(message);
                }
                // producers gone: keep serving redeliveries until nothing is
                // left uncommitted, then report the stream closed
                Ok(None) => {
                    drop(rx);
                    if let Some(message) = self.due_redelivery() {
                        return Ok(message);
                    }
                    if !self.has_in_flight() {
                        return Err(BrokerError::Closed);
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                // poll tick: loop around and re-check redeliveries
                Err(_) => {}
            }
        }
    }

    async fn commit(&self, message: &StreamMessage) -> Result<(), BrokerError> {
        let mut in_flight = self.in_flight_lock();
        if let Some(pos) = in_flight
            .iter()
            .position(|entry| entry.message.offset == message.offset)
        {
            in_flight.remove(pos);
        }
        // committing an already-retired offset is a harmless duplicate
        Ok(())
    }

    async fn close(&self) {
        self.rx.lock().await.close();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_fetch_commit() {
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_secs(60));

        let offset = publisher.publish(b"one".to_vec()).await.unwrap();
        let message = broker.fetch().await.unwrap();
        assert_eq!(message.offset, offset);
        assert_eq!(message.payload, b"one");

        broker.commit(&message).await.unwrap();
        assert!(!broker.has_in_flight());
    }

    #[tokio::test]
    async fn test_offsets_are_sequential() {
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_secs(60));

        publisher.publish(b"a".to_vec()).await.unwrap();
        publisher.publish(b"b".to_vec()).await.unwrap();

        assert_eq!(broker.fetch().await.unwrap().offset, 0);
        assert_eq!(broker.fetch().await.unwrap().offset, 1);
    }

    #[tokio::test]
    async fn test_uncommitted_message_is_redelivered() {
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_millis(30));

        publisher.publish(b"retry-me".to_vec()).await.unwrap();
        let first = broker.fetch().await.unwrap();
        // no commit: the same offset must come back after the delay
        let again = broker.fetch().await.unwrap();

        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn test_committed_message_is_not_redelivered() {
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_millis(20));

        publisher.publish(b"done".to_vec()).await.unwrap();
        publisher.publish(b"next".to_vec()).await.unwrap();

        let first = broker.fetch().await.unwrap();
        broker.commit(&first).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = broker.fetch().await.unwrap();
        assert_ne!(first.offset, second.offset);
    }

    #[tokio::test]
    async fn test_fetch_reports_closed_when_drained() {
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_secs(60));
        drop(publisher);

        match broker.fetch().await {
            Err(BrokerError::Closed) => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_commit_is_harmless() {
        let (broker, publisher) = MemoryBroker::channel(8, Duration::from_secs(60));

        publisher.publish(b"once".to_vec()).await.unwrap();
        let message = broker.fetch().await.unwrap();

        broker.commit(&message).await.unwrap();
        broker.commit(&message).await.unwrap();
    }
}
