//! Node module - Genesis, configuration, and the per-process node handle

mod genesis;
mod config;

pub use genesis::*;
pub use config::*;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::consensus::{resolve, Block, Resolution};
use crate::ledger::{Ledger, SharedLedger, Transaction};
use crate::mining::{Miner, MiningError};
use crate::p2p::{NodeRegistry, PeerClient};

/// Everything one node owns: its ledger, peers, miner and peer client
#[derive(Debug, Clone)]
pub struct Node {
    ledger: SharedLedger,
    registry: Arc<Mutex<NodeRegistry>>,
    miner: Miner,
    peers: PeerClient,
}

impl Node {
    /// Build a node from validated configuration
    pub fn new(config: &NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut registry = NodeRegistry::new();
        for peer in &config.peers {
            registry.register(peer)?;
        }

        let peers = PeerClient::new(config.peer_timeout, config.max_peer_response_bytes)?;
        let miner = Miner::new(config.node_id_or_random()).with_timeout(config.mining_timeout);

        Ok(Self {
            ledger: SharedLedger::new(Ledger::new()),
            registry: Arc::new(Mutex::new(registry)),
            miner,
            peers,
        })
    }

    /// The node's ledger
    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// The node's miner
    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    /// Identifier credited with mining rewards
    pub fn node_id(&self) -> &str {
        self.miner.node_id()
    }

    fn registry(&self) -> MutexGuard<'_, NodeRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a transaction, returning the predicted block index
    pub fn submit_transaction(&self, transaction: Transaction) -> u64 {
        self.ledger.submit_transaction(transaction)
    }

    /// Mine one block with the node's miner
    pub async fn mine(&self) -> Result<Block, MiningError> {
        self.miner.mine(&self.ledger).await
    }

    /// Register peers, returning the addresses that were rejected
    pub fn register_nodes<'a>(&self, addresses: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        self.registry().register_all(addresses)
    }

    /// Known peers
    pub fn nodes(&self) -> Vec<String> {
        self.registry().nodes()
    }

    /// Fetch every peer's chain and adopt the longest valid one.
    ///
    /// Validation runs on the blocking pool. The adoption re-checks length
    /// under the ledger lock, so a block sealed locally during the fetch is
    /// never lost to an equally long peer chain.
    pub async fn resolve_conflicts(&self) -> Resolution {
        let nodes = self.nodes();
        let peer_count = nodes.len();
        let candidates = self.peers.fetch_all(nodes).await;

        let own = self.ledger.chain();
        let resolution = match tokio::task::spawn_blocking(move || resolve(&own, candidates)).await {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(%err, "chain validation worker failed");
                return Resolution {
                    replaced: false,
                    chain: self.ledger.chain(),
                };
            }
        };
        info!(
            peers = peer_count,
            replaced = resolution.replaced,
            length = resolution.chain.len(),
            "conflict resolution finished"
        );

        self.apply_resolution(resolution)
    }

    /// Install the winner of a resolution round.
    ///
    /// If the local chain grew to at least the winner's length since the
    /// round started, the local chain is kept and reported instead.
    fn apply_resolution(&self, resolution: Resolution) -> Resolution {
        if resolution.replaced && !self.ledger.adopt_chain(resolution.chain.clone()) {
            info!("local chain grew during resolution, keeping it");
            return Resolution {
                replaced: false,
                chain: self.ledger.chain(),
            };
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{is_valid_chain, PeerChain};

    #[test]
    fn test_node_registers_configured_peers() {
        let config = NodeConfig {
            peers: vec!["http://127.0.0.1:5001".into(), "127.0.0.1:5001".into()],
            node_id: Some("node-a".into()),
            ..NodeConfig::default()
        };
        let node = Node::new(&config).unwrap();
        assert_eq!(node.nodes(), vec!["127.0.0.1:5001"]);
        assert_eq!(node.node_id(), "node-a");
        assert_eq!(node.ledger().len(), 1);
    }

    #[test]
    fn test_node_rejects_bad_peer() {
        let config = NodeConfig {
            peers: vec!["".into()],
            ..NodeConfig::default()
        };
        assert!(matches!(Node::new(&config), Err(ConfigError::Peer(_))));
    }

    #[tokio::test]
    async fn test_resolve_without_peers_keeps_chain() {
        let node = Node::new(&NodeConfig::default()).unwrap();
        let resolution = node.resolve_conflicts().await;
        assert!(!resolution.replaced);
        assert_eq!(resolution.chain, node.ledger().chain());
    }

    #[tokio::test]
    async fn test_local_seal_during_resolution_wins() {
        let node = Node::new(&NodeConfig {
            node_id: Some("node-a".into()),
            ..NodeConfig::default()
        })
        .unwrap();

        let peer_ledger = SharedLedger::new(Ledger::new());
        Miner::new("node-b").mine(&peer_ledger).await.unwrap();
        let peer_chain = peer_ledger.chain();

        let resolution = resolve(&node.ledger().chain(), vec![PeerChain::new(peer_chain.clone())]);
        assert!(resolution.replaced);

        let local = node.mine().await.unwrap();
        let applied = node.apply_resolution(resolution);

        assert!(!applied.replaced);
        assert_eq!(applied.chain, node.ledger().chain());
        assert_eq!(node.ledger().len(), 2);
        assert_eq!(node.ledger().chain()[1], local);
        assert_ne!(node.ledger().chain(), peer_chain);
        assert!(is_valid_chain(&node.ledger().chain()));
    }

    #[tokio::test]
    async fn test_apply_resolution_adopts_longer_chain() {
        let node = Node::new(&NodeConfig::default()).unwrap();
        let peer_ledger = SharedLedger::new(Ledger::new());
        Miner::new("node-b").mine(&peer_ledger).await.unwrap();

        let resolution = resolve(&node.ledger().chain(), vec![PeerChain::new(peer_ledger.chain())]);
        let applied = node.apply_resolution(resolution);

        assert!(applied.replaced);
        assert_eq!(node.ledger().chain(), peer_ledger.chain());
    }
}
