//! Block miner implementation
//!
//! Snapshots the tip, searches for a proof without holding the ledger lock,
//! then seals the pending pool plus a reward transaction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consensus::{search_until, Block};
use crate::crypto::Hash;
use crate::ledger::{SharedLedger, Transaction};

/// Mining errors
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("Mining was cancelled")]
    Cancelled,
    #[error("Mining timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Mining worker failed: {0}")]
    Worker(String),
    #[error("Ledger has no blocks to build on")]
    EmptyLedger,
}

/// Tip of the chain as seen when a search starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipSnapshot {
    /// Proof of the last block
    pub proof: u64,
    /// Digest of the last block
    pub hash: Hash,
}

impl TipSnapshot {
    /// Snapshot the current tip under a brief lock
    pub fn take(ledger: &SharedLedger) -> Option<Self> {
        let ledger = ledger.lock();
        let last = ledger.last_block()?;
        Some(Self {
            proof: last.proof,
            hash: last.hash(),
        })
    }
}

/// Block miner
#[derive(Debug, Clone)]
pub struct Miner {
    /// Identifier credited with mining rewards
    node_id: String,
    /// Upper bound on a single `mine` call
    timeout: Option<Duration>,
    /// Stop signal
    stop_signal: Arc<AtomicBool>,
}

impl Miner {
    /// Create a new miner crediting rewards to `node_id`
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            timeout: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bound each `mine` call by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Identifier credited with rewards
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Get a stop signal handle
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Stop mining
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Reset stop signal
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }

    /// Mine one block on top of `ledger`.
    ///
    /// If the tip moves while searching (another seal or a chain
    /// replacement) the found proof is discarded and the search restarts
    /// against the new tip.
    pub async fn mine(&self, ledger: &SharedLedger) -> Result<Block, MiningError> {
        let Some(limit) = self.timeout else {
            return self.mine_with_cancel(ledger, Arc::new(AtomicBool::new(false))).await;
        };

        let expired = Arc::new(AtomicBool::new(false));
        match tokio::time::timeout(limit, self.mine_with_cancel(ledger, Arc::clone(&expired))).await {
            Ok(result) => result,
            Err(_) => {
                expired.store(true, Ordering::SeqCst);
                warn!(?limit, "mining timed out");
                Err(MiningError::TimedOut(limit))
            }
        }
    }

    async fn mine_with_cancel(
        &self,
        ledger: &SharedLedger,
        expired: Arc<AtomicBool>,
    ) -> Result<Block, MiningError> {
        loop {
            let tip = TipSnapshot::take(ledger).ok_or(MiningError::EmptyLedger)?;
            let stop = self.stop_signal();
            let expired = Arc::clone(&expired);

            let proof = tokio::task::spawn_blocking(move || {
                search_until(tip.proof, || {
                    stop.load(Ordering::Relaxed) || expired.load(Ordering::Relaxed)
                })
            })
            .await
            .map_err(|err| MiningError::Worker(err.to_string()))?
            .ok_or(MiningError::Cancelled)?;

            match self.try_seal(ledger, tip, proof) {
                Some(block) => {
                    info!(index = block.index, proof, "mined block");
                    return Ok(block);
                }
                None => debug!(stale_tip = %tip.hash, "tip moved during search, restarting"),
            }
        }
    }

    /// Seal a block for `proof` if the tip is still `tip`.
    ///
    /// The reward is queued and the block sealed in one critical section, so
    /// no submission can land between them.
    pub fn try_seal(&self, ledger: &SharedLedger, tip: TipSnapshot, proof: u64) -> Option<Block> {
        let mut ledger = ledger.lock();
        if ledger.last_block().map(Block::hash) != Some(tip.hash) {
            return None;
        }

        ledger.submit_transaction(Transaction::reward(self.node_id.as_str()));
        Some(ledger.seal_block(proof, Some(tip.hash)))
    }
}
