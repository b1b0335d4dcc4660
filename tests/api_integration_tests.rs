//! Integration Tests for the peer protocol and JSON endpoints
//!
//! Exercises the router in-process and a two-node cluster over loopback HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mini_groupcache::{
    api::create_router, AppState, Getter, GetterFn, Group, GroupRegistry, HttpPool,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

// == Helper Functions ==

/// Loader that answers every key with `<key>@<node>` and counts its calls.
fn tagged_loader(node: &'static str, calls: Arc<AtomicUsize>) -> Arc<dyn Getter> {
    Arc::new(GetterFn(move |key: &str| -> anyhow::Result<Vec<u8>> {
        calls.fetch_add(1, Ordering::SeqCst);
        if key == "missing" {
            anyhow::bail!("{} not exist", key);
        }
        Ok(format!("{}@{}", key, node).into_bytes())
    }))
}

fn create_test_app() -> Router {
    let registry = Arc::new(GroupRegistry::new());
    registry.create(
        "scores",
        1024,
        tagged_loader("local", Arc::new(AtomicUsize::new(0))),
    );
    create_router(AppState::new(registry))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, body.to_vec())
}

struct Node {
    addr: String,
    group: Arc<Group>,
    pool: Arc<HttpPool>,
    loads: Arc<AtomicUsize>,
}

/// Starts a node serving the `scores` group on an already bound listener.
fn start_node(
    name: &'static str,
    listener: TcpListener,
    addr: String,
    peers: &[&str],
    peer_timeout: Duration,
) -> Node {
    let loads = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(GroupRegistry::new());
    let group = registry.insert(
        Group::new("scores", 4096, tagged_loader(name, Arc::clone(&loads)))
            .with_peer_timeout(peer_timeout),
    );

    let pool = Arc::new(HttpPool::new(&addr));
    pool.set_peers(peers.iter().copied());
    group.register_peers(pool.clone());

    let app = create_router(AppState::new(registry));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Node {
        addr,
        group,
        pool,
        loads,
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    (listener, addr)
}

async fn two_node_cluster() -> (Node, Node) {
    let (listener_a, addr_a) = bind().await;
    let (listener_b, addr_b) = bind().await;
    let peers = [addr_a.as_str(), addr_b.as_str()];

    let a = start_node("a", listener_a, addr_a.clone(), &peers, Duration::from_secs(2));
    let b = start_node("b", listener_b, addr_b.clone(), &peers, Duration::from_secs(2));
    (a, b)
}

/// First key of the form `<prefix><n>` owned by `owner`.
fn key_owned_by(pool: &HttpPool, owner: &str, prefix: &str) -> String {
    (0..10_000)
        .map(|i| format!("{}{}", prefix, i))
        .find(|key| pool.owner_of(key).as_deref() == Some(owner))
        .expect("no key routes to the requested owner")
}

// == Peer Endpoint Tests ==

#[tokio::test]
async fn test_peer_endpoint_returns_raw_bytes() {
    let (status, content_type, body) = get(create_test_app(), "/_geecache/scores/Tom").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(body, b"Tom@local");
}

#[tokio::test]
async fn test_peer_endpoint_key_may_contain_slashes() {
    let app = create_test_app();

    let (status, _, body) = get(app.clone(), "/_geecache/scores/dir/file").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"dir/file@local");

    let (status, _, body) = get(app, "/_geecache/scores/dir%2Ffile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"dir/file@local");
}

#[tokio::test]
async fn test_peer_endpoint_errors() {
    let app = create_test_app();

    let (status, _, _) = get(app.clone(), "/_geecache/scores").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = get(app.clone(), "/_geecache/scores/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = get(app.clone(), "/_geecache/nope/Tom").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("nope"));

    let (status, _, body) = get(app, "/_geecache/scores/missing").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "missing not exist");
}

// == JSON Endpoint Tests ==

#[tokio::test]
async fn test_api_and_stats_endpoints() {
    let app = create_test_app();

    let (status, _, body) = get(app.clone(), "/api/scores?key=Jack").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["value"], "Jack@local");
    assert_eq!(json["size"], 10);

    let _ = get(app.clone(), "/api/scores?key=Jack").await;

    let (status, _, body) = get(app, "/stats/scores").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["gets"], 2);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["local_loads"], 1);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, _, body) = get(create_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

// == Cluster Tests ==

#[tokio::test]
async fn test_remote_key_is_fetched_from_owner() {
    let (a, b) = two_node_cluster().await;
    let key = key_owned_by(&a.pool, &b.addr, "key-");

    let value = a.group.get(&key).await.unwrap();
    assert_eq!(value.to_string_lossy(), format!("{}@b", key));

    // Only the owner loaded and cached it
    assert_eq!(a.loads.load(Ordering::SeqCst), 0);
    assert_eq!(b.loads.load(Ordering::SeqCst), 1);
    assert!(a.group.peek(&key).is_none());
    assert!(b.group.peek(&key).is_some());

    // A second read is served from the owner's cache
    a.group.get(&key).await.unwrap();
    assert_eq!(b.loads.load(Ordering::SeqCst), 1);
    assert_eq!(a.group.stats().peer_loads, 2);
    assert_eq!(b.group.stats().hits, 1);
}

#[tokio::test]
async fn test_local_key_is_loaded_locally() {
    let (a, b) = two_node_cluster().await;
    let key = key_owned_by(&a.pool, &a.addr, "key-");

    let value = a.group.get(&key).await.unwrap();

    assert_eq!(value.to_string_lossy(), format!("{}@a", key));
    assert_eq!(a.loads.load(Ordering::SeqCst), 1);
    assert_eq!(b.loads.load(Ordering::SeqCst), 0);
    assert!(a.group.peek(&key).is_some());
}

#[tokio::test]
async fn test_remote_key_with_slash() {
    let (a, b) = two_node_cluster().await;
    let key = key_owned_by(&a.pool, &b.addr, "dir/");

    let value = a.group.get(&key).await.unwrap();

    assert_eq!(value.to_string_lossy(), format!("{}@b", key));
}

#[tokio::test]
async fn test_remote_loader_error_falls_back_locally() {
    let (a, b) = two_node_cluster().await;

    // "missing" fails everywhere; whichever node owns it, A's caller sees A's loader error
    let err = a.group.get("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "missing not exist");
    assert_eq!(a.loads.load(Ordering::SeqCst), 1);
    if a.pool.owner_of("missing").as_deref() == Some(b.addr.as_str()) {
        assert_eq!(b.loads.load(Ordering::SeqCst), 1);
        assert_eq!(a.group.stats().peer_errors, 1);
    }
}

#[tokio::test]
async fn test_dead_peer_falls_back_to_loader() {
    let (listener, addr) = bind().await;
    // Nothing listens on the dead peer's port once its listener is dropped
    let (dead_listener, dead_addr) = bind().await;
    drop(dead_listener);

    let node = start_node(
        "a",
        listener,
        addr,
        &[],
        Duration::from_millis(500),
    );
    node.pool.set_peers([node.addr.as_str(), dead_addr.as_str()]);
    let key = key_owned_by(&node.pool, &dead_addr, "key-");

    let value = node.group.get(&key).await.unwrap();

    assert_eq!(value.to_string_lossy(), format!("{}@a", key));
    assert_eq!(node.loads.load(Ordering::SeqCst), 1);
    assert_eq!(node.group.stats().peer_errors, 1);
    assert!(node.group.peek(&key).is_some());
}
