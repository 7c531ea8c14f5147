//! Node configuration

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::p2p::{PeerError, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_PEER_TIMEOUT};

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("peer_timeout must be greater than zero")]
    ZeroPeerTimeout,
    #[error("max_peer_response_bytes must be greater than zero")]
    ZeroResponseCap,
    #[error("{0} must be greater than zero when set")]
    ZeroInterval(&'static str),
    #[error("node_id must not be empty")]
    EmptyNodeId,
    #[error(transparent)]
    Peer(#[from] PeerError),
}

/// Runtime settings for one node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// Identifier credited with mining rewards; random when unset
    pub node_id: Option<String>,
    /// Peers registered at startup
    pub peers: Vec<String>,
    /// Deadline for fetching one peer's chain
    pub peer_timeout: Duration,
    /// Largest `/chain` body accepted from a peer
    pub max_peer_response_bytes: usize,
    /// Upper bound on a single mining request
    pub mining_timeout: Option<Duration>,
    /// Run conflict resolution on this period
    pub resolve_interval: Option<Duration>,
}

impl NodeConfig {
    /// Reject settings that would make the node unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peer_timeout.is_zero() {
            return Err(ConfigError::ZeroPeerTimeout);
        }
        if self.max_peer_response_bytes == 0 {
            return Err(ConfigError::ZeroResponseCap);
        }
        if self.mining_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroInterval("mining_timeout"));
        }
        if self.resolve_interval.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroInterval("resolve_interval"));
        }
        if self.node_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ConfigError::EmptyNodeId);
        }
        Ok(())
    }

    /// The configured node identifier, or a freshly generated one
    pub fn node_id_or_random(&self) -> String {
        self.node_id.clone().unwrap_or_else(generate_node_id)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            node_id: None,
            peers: Vec::new(),
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            max_peer_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            mining_timeout: None,
            resolve_interval: None,
        }
    }
}

/// Random 128-bit node identifier rendered as 32 hex characters
pub fn generate_node_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
