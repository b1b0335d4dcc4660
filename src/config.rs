//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::peers::{DEFAULT_BASE_PATH, DEFAULT_REPLICAS};

const DEFAULT_PORT: u16 = 8001;
const DEFAULT_CACHE_BYTES: usize = 2 << 10;
const DEFAULT_PEER_TIMEOUT_MS: u64 = 3000;
const DEFAULT_GROUP_NAME: &str = "scores";

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Address other nodes use to reach this one
    pub node_addr: String,
    /// Every node in the cluster, this one included
    pub peers: Vec<String>,
    /// Byte budget of the demo group's local cache (0 = unbounded)
    pub cache_bytes: usize,
    /// Virtual ring positions per peer
    pub replicas: usize,
    /// Deadline for a single peer fetch, in milliseconds
    pub peer_timeout_ms: u64,
    /// Path prefix of the peer protocol
    pub base_path: String,
    /// Name of the group served by the binary
    pub group_name: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8001)
    /// - `NODE_ADDR` - This node's base URL (default: `http://localhost:<port>`)
    /// - `PEERS` - Comma-separated base URLs of all nodes (default: `NODE_ADDR`)
    /// - `CACHE_BYTES` - Local cache budget in bytes (default: 2048)
    /// - `REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `PEER_TIMEOUT_MS` - Peer fetch deadline (default: 3000)
    /// - `BASE_PATH` - Peer protocol prefix (default: `/_geecache/`)
    /// - `GROUP_NAME` - Served group (default: `scores`)
    pub fn from_env() -> Self {
        let server_port = parse_var("SERVER_PORT").unwrap_or(DEFAULT_PORT);
        let node_addr = env::var("NODE_ADDR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", server_port));

        let mut peers = env::var("PEERS")
            .map(|v| parse_peers(&v))
            .unwrap_or_default();
        if peers.is_empty() {
            peers.push(node_addr.clone());
        }

        Self {
            server_port,
            node_addr,
            peers,
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(DEFAULT_CACHE_BYTES),
            replicas: parse_var("REPLICAS").unwrap_or(DEFAULT_REPLICAS),
            peer_timeout_ms: parse_var("PEER_TIMEOUT_MS").unwrap_or(DEFAULT_PEER_TIMEOUT_MS),
            base_path: env::var("BASE_PATH")
                .map(|v| normalize_base_path(&v))
                .unwrap_or_else(|_| DEFAULT_BASE_PATH.to_string()),
            group_name: env::var("GROUP_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string()),
        }
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let node_addr = format!("http://localhost:{}", DEFAULT_PORT);
        Self {
            server_port: DEFAULT_PORT,
            peers: vec![node_addr.clone()],
            node_addr,
            cache_bytes: DEFAULT_CACHE_BYTES,
            replicas: DEFAULT_REPLICAS,
            peer_timeout_ms: DEFAULT_PEER_TIMEOUT_MS,
            base_path: DEFAULT_BASE_PATH.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Splits a comma-separated peer list, dropping blanks.
fn parse_peers(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensures the prefix starts and ends with `/`.
fn normalize_base_path(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
