//! HTTP server
//!
//! Axum router exposing the ledger to clients and peers.

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::node::Node;
use crate::rpc::handlers::{
    full_chain, list_nodes, mine, new_transaction, register_nodes, resolve_nodes,
};

/// Build the node's router
pub fn build_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/transactions/new", post(new_transaction))
        .route("/mine", get(mine))
        .route("/chain", get(full_chain))
        .route("/nodes", get(list_nodes))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve_nodes))
        .layer(cors)
        .with_state(node)
}

/// Serve the node on `listener` until `shutdown` completes
pub async fn serve(
    listener: TcpListener,
    node: Arc<Node>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, node_id = node.node_id(), "ledger node listening");

    axum::serve(listener, build_router(node))
        .with_graceful_shutdown(shutdown)
        .await
}
