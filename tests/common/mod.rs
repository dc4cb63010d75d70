//! Shared test doubles and fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::TimeZone;

use orderflow::error::RepositoryError;
use orderflow::models::{Delivery, Item, Order, Payment};
use orderflow::repository::OrderRepository;

// == In-Memory Repository ==
/// Order store backed by a HashMap, with call counting and programmable
/// failures for exercising retry paths.
#[derive(Default)]
pub struct InMemoryRepository {
    orders: Mutex<HashMap<String, Order>>,
    pub save_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    /// Number of upcoming save calls that will fail
    fail_next_saves: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.orders.lock().unwrap();
            for order in orders {
                map.insert(order.order_uid.clone(), order);
            }
        }
        repo
    }

    pub fn fail_next_saves(&self, count: usize) {
        self.fail_next_saves.store(count, Ordering::SeqCst);
    }

    pub fn stored_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn stored(&self, order_uid: &str) -> Option<Order> {
        self.orders.lock().unwrap().get(order_uid).cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_next_saves.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_saves.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("injected save failure".into()));
        }

        self.orders
            .lock()
            .unwrap()
            .insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.orders
            .lock()
            .unwrap()
            .get(order_uid)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(order_uid.to_string()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.orders.lock().unwrap().values().cloned().collect())
    }
}

// == Fixtures ==
/// Builds a well-formed order.
pub fn sample_order(uid: &str) -> Order {
    Order {
        order_uid: uid.to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: uid.to_string(),
            request_id: "req-1".to_string(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: 1637907727,
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![Item {
            chrt_id: 9934930,
            track_number: "WBILMTESTTRACK".to_string(),
            price: 453,
            rid: "ab4219087a764ae0btest".to_string(),
            name: "Mascaras".to_string(),
            sale: 30,
            size: "0".to_string(),
            total_price: 317,
            nm_id: 2389212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
        }],
        locale: "en".to_string(),
        internal_signature: "sig".to_string(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        date_created: chrono::Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap(),
        oof_shard: "1".to_string(),
    }
}

/// The sample order serialized to its wire format.
pub fn sample_order_json(uid: &str) -> Vec<u8> {
    serde_json::to_vec(&sample_order(uid)).unwrap()
}

// == Polling Helper ==
/// Polls `condition` until it holds or the deadline passes.
pub async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
