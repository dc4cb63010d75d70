//! Error types for the order service
//!
//! One error enum per external boundary, unified with thiserror. Only the
//! lookup-facing `ServiceError` maps to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Repository Error ==
/// Failures crossing the persistence boundary.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No order exists under the requested uid
    #[error("order not found: {0}")]
    NotFound(String),

    /// Could not obtain a connection from the pool
    #[error("connection pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A statement failed to execute
    #[error("query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// The store rejected or could not complete the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// True only for the definite "no such row" outcome; everything else is
    /// treated as transient.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}

// == Broker Error ==
/// Failures crossing the message stream boundary.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The stream is closed and will deliver no further messages
    #[error("stream closed")]
    Closed,

    /// A transient fetch or commit failure
    #[error("stream i/o: {0}")]
    Io(String),
}

// == Service Error ==
/// Lookup outcomes surfaced to the read API.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The order is in neither the cache nor the store
    #[error("order not found: {0}")]
    NotFound(String),

    /// The store could not answer; the caller may retry
    #[error("order lookup unavailable: {0}")]
    Unavailable(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
