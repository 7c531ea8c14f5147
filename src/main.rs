//! Ledger node
//!
//! Main entry point: parses flags, starts the HTTP API and, when asked,
//! periodic conflict resolution.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ledger_core::node::{Node, NodeConfig, DEFAULT_LISTEN_ADDR};
use ledger_core::p2p::DEFAULT_MAX_RESPONSE_BYTES;
use ledger_core::rpc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Proof-of-work ledger node
#[derive(Debug, Parser)]
#[command(name = "ledger-node", version, about)]
struct Cli {
    /// Address to serve the HTTP API on
    #[arg(long, env = "LEDGER_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Identifier credited with mining rewards (random when omitted)
    #[arg(long, env = "LEDGER_NODE_ID")]
    node_id: Option<String>,

    /// Peer to register at startup; repeatable
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Seconds to wait for one peer's chain
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_SECS", default_value_t = 5)]
    peer_timeout_secs: u64,

    /// Largest peer chain response accepted, in bytes
    #[arg(long, env = "LEDGER_MAX_PEER_RESPONSE_BYTES", default_value_t = DEFAULT_MAX_RESPONSE_BYTES)]
    max_peer_response_bytes: usize,

    /// Abandon a mining request after this many seconds
    #[arg(long, env = "LEDGER_MINING_TIMEOUT_SECS")]
    mining_timeout_secs: Option<u64>,

    /// Resolve conflicts with peers every this many seconds
    #[arg(long, env = "LEDGER_RESOLVE_INTERVAL_SECS")]
    resolve_interval_secs: Option<u64>,
}

impl From<Cli> for NodeConfig {
    fn from(cli: Cli) -> Self {
        NodeConfig {
            listen_addr: cli.listen,
            node_id: cli.node_id,
            peers: cli.peers,
            peer_timeout: Duration::from_secs(cli.peer_timeout_secs),
            max_peer_response_bytes: cli.max_peer_response_bytes,
            mining_timeout: cli.mining_timeout_secs.map(Duration::from_secs),
            resolve_interval: cli.resolve_interval_secs.map(Duration::from_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from(Cli::parse());
    let node = Arc::new(Node::new(&config)?);
    info!(
        node_id = node.node_id(),
        peers = node.nodes().len(),
        "node initialized"
    );

    if let Some(period) = config.resolve_interval {
        let resolver = Arc::clone(&node);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                resolver.resolve_conflicts().await;
            }
        });
    }

    let listener = TcpListener::bind(config.listen_addr).await?;
    let miner = node.miner().clone();
    let shutdown = async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received, stopping node");
        miner.stop();
    };

    rpc::serve(listener, node, shutdown).await?;
    Ok(())
}
