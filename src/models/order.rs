//! Order Domain Model
//!
//! Defines the order record and its nested parts as they arrive on the wire
//! and as they are persisted. An order is identified by its `order_uid` and
//! is treated as an immutable value once cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Order ==
/// A customer order, the unit of ingestion, persistence and lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, the cache and repository key
    pub order_uid: String,
    /// Logistics tracking number
    pub track_number: String,
    /// Entry channel code
    pub entry: String,
    /// Shipping details
    pub delivery: Delivery,
    /// Payment details
    pub payment: Payment,
    /// Ordered goods, at least one
    pub items: Vec<Item>,
    /// Customer locale
    pub locale: String,
    /// Internal routing signature
    pub internal_signature: String,
    /// Customer identifier
    pub customer_id: String,
    /// Delivery provider name
    pub delivery_service: String,
    /// Logical shard key assigned upstream
    pub shardkey: String,
    /// Upstream shard machine id
    pub sm_id: i64,
    /// Order creation timestamp
    pub date_created: DateTime<Utc>,
    /// Out-of-stock shard marker
    pub oof_shard: String,
}

// == Delivery ==
/// Shipping address and recipient contact details for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

// == Payment ==
/// Payment transaction details for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    /// ISO 4217 currency code
    pub currency: String,
    pub provider: String,
    /// Total charged amount, minor units
    pub amount: i64,
    /// Payment timestamp, Unix seconds
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

// == Item ==
/// A single ordered good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}
