//! Mini Groupcache - A distributed read-through cache
//!
//! Runs one cache node: serves the peer protocol and the JSON endpoints for
//! a single demo group backed by an in-memory score table.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_groupcache::api::create_router;
use mini_groupcache::{AppState, Config, Getter, GetterFn, Group, GroupRegistry, HttpPool};

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the group registry and the demo group
/// 4. Build the peer pool and register it with the group
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_groupcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Groupcache node");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: node={}, peers={:?}, cache_bytes={}, replicas={}, port={}",
        config.node_addr, config.peers, config.cache_bytes, config.replicas, config.server_port
    );

    let registry = Arc::new(GroupRegistry::new());
    let group = registry.insert(
        Group::new(&config.group_name, config.cache_bytes, score_loader())
            .with_peer_timeout(config.peer_timeout()),
    );

    let pool = HttpPool::new(&config.node_addr)
        .with_base_path(&config.base_path)
        .with_replicas(config.replicas);
    pool.set_peers(&config.peers);
    group.register_peers(Arc::new(pool));

    let state = AppState::new(registry).with_base_path(&config.base_path);
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Node listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Node shutdown complete");
    Ok(())
}

/// Loader over a fixed score table, standing in for a slow database.
fn score_loader() -> Arc<dyn Getter> {
    let db: HashMap<&'static str, &'static str> =
        [("Tom", "630"), ("Jack", "589"), ("Sam", "567")].into_iter().collect();

    Arc::new(GetterFn(move |key: &str| -> anyhow::Result<Vec<u8>> {
        info!("[SlowDB] search key {}", key);
        db.get(key)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| anyhow::anyhow!("{} not exist", key))
    }))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
