//! Integration tests for the node HTTP API and peer resolution
//!
//! Each test runs real nodes on loopback ports and talks to them over HTTP.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Json, Router};
use ledger_core::consensus::is_valid_chain;
use ledger_core::node::{Node, NodeConfig};
use ledger_core::p2p::{PeerClient, PeerError};
use ledger_core::rpc;
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

async fn spawn_node(node_id: &str) -> (String, Arc<Node>) {
    let config = NodeConfig {
        node_id: Some(node_id.to_string()),
        peer_timeout: Duration::from_secs(2),
        ..NodeConfig::default()
    };
    let node = Arc::new(Node::new(&config).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(rpc::serve(listener, Arc::clone(&node), std::future::pending()));
    (addr.to_string(), node)
}

#[tokio::test]
async fn test_transaction_mine_chain_flow() {
    let (addr, _node) = spawn_node("node-a").await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{}/transactions/new", addr))
        .json(&json!({"sender": "a", "recipient": "b", "amount": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["predicted_block_index"], 2);
    assert_eq!(body["message"], "Transaction will be added to Block 2");

    let response = http.get(format!("http://{}/mine", addr)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let block: Value = response.json().await.unwrap();
    assert_eq!(block["message"], "New Block Forged");
    assert_eq!(block["index"], 2);
    assert_eq!(block["proof"], 35_293);
    assert_eq!(block["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(block["transactions"][1]["sender"], "0");
    assert_eq!(block["transactions"][1]["recipient"], "node-a");

    let response = http.get(format!("http://{}/chain", addr)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let chain: Value = response.json().await.unwrap();
    assert_eq!(chain["length"], 2);
    assert_eq!(chain["chain"][0]["previous_hash"], 1);
    assert_eq!(chain["chain"][1]["previous_hash"], block["previous_hash"]);
}

#[tokio::test]
async fn test_missing_transaction_fields_rejected() {
    let (addr, node) = spawn_node("node-a").await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{}/transactions/new", addr))
        .json(&json!({"sender": "a", "amount": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing values: recipient");

    let response = http
        .post(format!("http://{}/transactions/new", addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    assert!(node.ledger().lock().pending().is_empty());
}

#[tokio::test]
async fn test_register_nodes() {
    let (addr, node) = spawn_node("node-a").await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{}/nodes/register", addr))
        .json(&json!({"nodes": ["http://127.0.0.1:5001", "127.0.0.1:5001", ""]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_nodes"], json!(["127.0.0.1:5001"]));
    assert_eq!(body["rejected"], json!([""]));
    assert_eq!(node.nodes(), vec!["127.0.0.1:5001"]);

    let response = http
        .post(format!("http://{}/nodes/register", addr))
        .json(&json!({"nodes": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let listed: Value = http
        .get(format!("http://{}/nodes", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["nodes"], json!(["127.0.0.1:5001"]));
}

#[tokio::test]
async fn test_resolve_adopts_longer_peer_chain() {
    let (addr_a, node_a) = spawn_node("node-a").await;
    let (addr_b, node_b) = spawn_node("node-b").await;
    let http = reqwest::Client::new();

    node_a.mine().await.unwrap();
    for _ in 0..3 {
        node_b.mine().await.unwrap();
    }

    node_a.register_nodes([addr_b.as_str(), "127.0.0.1:1"]);
    let response = http
        .get(format!("http://{}/nodes/resolve", addr_a))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Our chain was replaced");
    assert_eq!(body["new_chain"].as_array().unwrap().len(), 4);

    assert_eq!(node_a.ledger().chain(), node_b.ledger().chain());
    assert!(is_valid_chain(&node_a.ledger().chain()));

    // B is now the shorter side's peer and keeps its own chain
    node_b.register_nodes([addr_a.as_str()]);
    let body: Value = http
        .get(format!("http://{}/nodes/resolve", addr_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Our chain is authoritative");
    assert_eq!(body["chain"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_resolve_ignores_invalid_peer_chain() {
    let (_, node_a) = spawn_node("node-a").await;
    let (_, node_b) = spawn_node("node-b").await;
    for _ in 0..2 {
        node_b.mine().await.unwrap();
    }

    let mut forged = node_b.ledger().chain();
    forged[1].proof = 0;
    let forged_body = json!({"length": forged.len(), "chain": forged});
    let evil = spawn_router(Router::new().route(
        "/chain",
        get(move || {
            let body = forged_body.clone();
            async move { Json(body) }
        }),
    ))
    .await;

    node_a.register_nodes([evil.as_str()]);
    let resolution = node_a.resolve_conflicts().await;

    assert!(!resolution.replaced);
    assert_eq!(node_a.ledger().len(), 1);
}

#[tokio::test]
async fn test_peer_client_limits() {
    let (addr, node) = spawn_node("node-a").await;
    node.mine().await.unwrap();

    let client = PeerClient::new(Duration::from_secs(2), 1024 * 1024).unwrap();
    let fetched = client.fetch_chain(&addr).await.unwrap();
    assert_eq!(fetched.length, 2);
    assert_eq!(fetched.chain, node.ledger().chain());

    let tiny = PeerClient::new(Duration::from_secs(2), 16).unwrap();
    assert!(matches!(
        tiny.fetch_chain(&addr).await,
        Err(PeerError::ResponseTooLarge(16))
    ));

    let garbage = spawn_router(Router::new().route("/chain", get(|| async { Json(json!({"foo": 1})) }))).await;
    assert!(matches!(
        client.fetch_chain(&garbage).await,
        Err(PeerError::Malformed(_))
    ));

    let hung = spawn_router(Router::new().route(
        "/chain",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!({}))
        }),
    ))
    .await;
    let quick = PeerClient::new(Duration::from_millis(200), 1024).unwrap();
    let started = Instant::now();
    assert!(quick.fetch_chain(&hung).await.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));

    let chains = quick.fetch_all(vec![hung, addr.clone()]).await;
    assert_eq!(chains.len(), 1);
}
