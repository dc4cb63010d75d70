//! Response DTOs for the order service API
//!
//! Defines the structure of outgoing HTTP response bodies. Order lookups
//! serialize the `Order` model directly, so no wrapper is defined for them.

use serde::Serialize;

/// Response body for the ingest endpoint (POST /order)
///
/// The payload is only enqueued here; decoding and validation happen in the
/// ingestion pipeline, so acceptance does not imply the order is stored yet.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    /// Acknowledgement message
    pub message: String,
    /// Stream offset assigned to the enqueued payload
    pub offset: u64,
}

impl IngestResponse {
    /// Creates a new IngestResponse for an accepted payload
    pub fn accepted(offset: u64) -> Self {
        Self {
            message: "order accepted for processing".to_string(),
            offset,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of entries dropped on expired reads
    pub expirations: u64,
    /// Current number of entries in the cache
    pub entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a cache stats snapshot
    pub fn new(snapshot: crate::cache::StatsSnapshot, entries: usize) -> Self {
        Self {
            hits: snapshot.hits,
            misses: snapshot.misses,
            evictions: snapshot.evictions,
            expirations: snapshot.expirations,
            entries,
            hit_rate: snapshot.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_response_serialize() {
        let resp = IngestResponse::accepted(42);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("accepted"));
        assert!(json.contains("42"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
