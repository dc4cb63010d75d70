//! Order Validation Module
//!
//! Schema checks applied to decoded orders before persistence. The rule set
//! is built once and handed to the ingestion pipeline, so there is no global
//! validator state.

use thiserror::Error;

use crate::models::Order;

// == Validation Error ==
/// All rule violations found in one order, reported together.
#[derive(Error, Debug)]
#[error("order failed validation: {}", .violations.join("; "))]
pub struct ValidationError {
    /// Human-readable description of each violated rule
    pub violations: Vec<String>,
}

// == Order Validator ==
/// Immutable validation rule set for incoming orders.
#[derive(Debug, Clone)]
pub struct OrderValidator {
    /// Upper bound on `order_uid` length in bytes
    max_uid_length: usize,
    /// Accepted customer locales
    locales: Vec<String>,
}

impl OrderValidator {
    /// Maximum key length accepted by default.
    pub const DEFAULT_MAX_UID_LENGTH: usize = 64;

    /// Creates the standard rule set.
    pub fn new() -> Self {
        Self {
            max_uid_length: Self::DEFAULT_MAX_UID_LENGTH,
            locales: vec!["ru".to_string(), "en".to_string()],
        }
    }

    /// Creates a rule set with a custom uid length bound.
    pub fn with_max_uid_length(max_uid_length: usize) -> Self {
        Self {
            max_uid_length,
            ..Self::new()
        }
    }

    /// Checks an order against every rule, collecting all violations.
    pub fn validate(&self, order: &Order) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        self.check_identity(order, &mut violations);
        self.check_delivery(order, &mut violations);
        self.check_payment(order, &mut violations);
        self.check_items(order, &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    fn check_identity(&self, order: &Order, violations: &mut Vec<String>) {
        if order.order_uid.is_empty() {
            violations.push("order_uid is required".to_string());
        } else if order.order_uid.len() > self.max_uid_length {
            violations.push(format!(
                "order_uid exceeds {} bytes",
                self.max_uid_length
            ));
        }

        require(&order.track_number, "track_number", violations);
        require(&order.entry, "entry", violations);
        require(&order.customer_id, "customer_id", violations);
        require(&order.delivery_service, "delivery_service", violations);

        if !self.locales.iter().any(|l| l == &order.locale) {
            violations.push(format!("locale {:?} is not supported", order.locale));
        }
    }

    fn check_delivery(&self, order: &Order, violations: &mut Vec<String>) {
        let d = &order.delivery;
        require(&d.name, "delivery.name", violations);
        require(&d.phone, "delivery.phone", violations);
        require(&d.zip, "delivery.zip", violations);
        require(&d.city, "delivery.city", violations);
        require(&d.address, "delivery.address", violations);
        require(&d.region, "delivery.region", violations);

        if !d.email.contains('@') || d.email.starts_with('@') || d.email.ends_with('@') {
            violations.push("delivery.email is not a valid address".to_string());
        }
    }

    fn check_payment(&self, order: &Order, violations: &mut Vec<String>) {
        let p = &order.payment;
        require(&p.transaction, "payment.transaction", violations);
        require(&p.provider, "payment.provider", violations);
        require(&p.bank, "payment.bank", violations);

        if !is_currency_code(&p.currency) {
            violations.push(format!(
                "payment.currency {:?} is not a three-letter code",
                p.currency
            ));
        }
        if p.amount < 0 {
            violations.push("payment.amount must be non-negative".to_string());
        }
        if p.delivery_cost < 0 {
            violations.push("payment.delivery_cost must be non-negative".to_string());
        }
        if p.goods_total < 0 {
            violations.push("payment.goods_total must be non-negative".to_string());
        }
        if p.custom_fee < 0 {
            violations.push("payment.custom_fee must be non-negative".to_string());
        }
        if p.payment_dt <= 0 {
            violations.push("payment.payment_dt must be positive".to_string());
        }
    }

    fn check_items(&self, order: &Order, violations: &mut Vec<String>) {
        if order.items.is_empty() {
            violations.push("items must contain at least one entry".to_string());
            return;
        }

        for (i, item) in order.items.iter().enumerate() {
            if item.chrt_id <= 0 {
                violations.push(format!("items[{i}].chrt_id must be positive"));
            }
            if item.nm_id <= 0 {
                violations.push(format!("items[{i}].nm_id must be positive"));
            }
            if item.price < 0 {
                violations.push(format!("items[{i}].price must be non-negative"));
            }
            if item.total_price < 0 {
                violations.push(format!("items[{i}].total_price must be non-negative"));
            }
            if item.rid.is_empty() {
                violations.push(format!("items[{i}].rid is required"));
            }
            if item.name.is_empty() {
                violations.push(format!("items[{i}].name is required"));
            }
        }
    }
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn require(value: &str, field: &str, violations: &mut Vec<String>) {
    if value.is_empty() {
        violations.push(format!("{field} is required"));
    }
}

/// ISO 4217 shape check: exactly three ASCII uppercase letters.
fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}
