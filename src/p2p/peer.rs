//! Peer registry
//!
//! Peers are identified by their normalized `host:port` authority. There is
//! no discovery and no eviction: membership is whatever operators register.

use std::collections::BTreeSet;

use axum::http::Uri;
use tracing::info;

use crate::p2p::PeerError;

/// Normalize a peer address to `host[:port]`.
///
/// Accepts full URLs (`http://10.0.0.5:5000/ignored`) and bare authorities
/// (`10.0.0.5:5000`).
pub fn normalize_address(address: &str) -> Result<String, PeerError> {
    let trimmed = address.trim();
    let invalid = || PeerError::InvalidAddress(address.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let uri: Uri = trimmed.parse().map_err(|_| invalid())?;
    let authority = uri.authority().ok_or_else(invalid)?;
    if authority.host().is_empty() || authority.as_str().contains('@') {
        return Err(invalid());
    }

    Ok(authority.as_str().to_ascii_lowercase())
}

/// Set of known peer nodes
#[derive(Debug, Default, Clone)]
pub struct NodeRegistry {
    /// Normalized peer authorities
    nodes: BTreeSet<String>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer, returning its normalized address.
    ///
    /// Registering an already known peer is not an error.
    pub fn register(&mut self, address: &str) -> Result<String, PeerError> {
        let node = normalize_address(address)?;
        if self.nodes.insert(node.clone()) {
            info!(peer = %node, "registered peer");
        }
        Ok(node)
    }

    /// Register several peers, returning the addresses that were rejected
    pub fn register_all<'a>(&mut self, addresses: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        addresses
            .into_iter()
            .filter(|address| self.register(address).is_err())
            .map(str::to_string)
            .collect()
    }

    /// Whether a normalized address is known
    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// Known peers, sorted
    pub fn nodes(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    /// Number of known peers
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no peers are known
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
