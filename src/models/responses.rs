//! Response DTOs for the node's JSON endpoints
//!
//! Defines the structure of outgoing HTTP response bodies. Peer responses
//! are raw bytes and have no DTO.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `GET /api/:group?key=...`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// Group the key was read from
    pub group: String,
    /// The requested key
    pub key: String,
    /// The value, decoded as UTF-8 (invalid sequences replaced)
    pub value: String,
    /// Size of the raw value in bytes
    pub size: usize,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(group: impl Into<String>, key: impl Into<String>, value: &[u8]) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
            value: String::from_utf8_lossy(value).into_owned(),
            size: value.len(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats/:group)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Group name
    pub group: String,
    /// Configured byte budget (0 = unbounded)
    pub cache_bytes: usize,
    /// Counter snapshot
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / gets)
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a group's statistics
    pub fn new(group: impl Into<String>, cache_bytes: usize, stats: CacheStats) -> Self {
        Self {
            group: group.into(),
            cache_bytes,
            hit_rate: stats.hit_rate(),
            stats,
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
    fn test_get_response_serialize() {
        let resp = GetResponse::new("scores", "Tom", b"630");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["group"], "scores");
        assert_eq!(json["key"], "Tom");
        assert_eq!(json["value"], "630");
        assert_eq!(json["size"], 3);
    }

    #[test]
    fn test_get_response_lossy_value() {
        let resp = GetResponse::new("bin", "k", &[0xff, b'a']);
        assert_eq!(resp.value, "\u{fffd}a");
        assert_eq!(resp.size, 2);
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let stats = CacheStats {
            gets: 10,
            hits: 8,
            misses: 2,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new("scores", 2048, stats);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["group"], "scores");
        assert_eq!(json["cache_bytes"], 2048);
        assert_eq!(json["hits"], 8);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
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
