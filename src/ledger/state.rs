//! Ledger state management
//!
//! The chain and the pending-transaction pool live in one aggregate so a
//! single lock guards both. Nothing outside this module mutates them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::consensus::{Block, PreviousHash};
use crate::crypto::Hash;
use crate::ledger::Transaction;
use crate::node::genesis_block;

/// Seconds since the Unix epoch as a float
pub fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

/// Chain plus pending pool
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Sealed blocks, never empty
    chain: Vec<Block>,
    /// Transactions waiting for the next block
    pending: Vec<Transaction>,
}

impl Ledger {
    /// Create a ledger holding only a freshly stamped genesis block
    pub fn new() -> Self {
        Self {
            chain: vec![genesis_block(now_timestamp())],
            pending: Vec::new(),
        }
    }

    /// Queue a transaction for the next block.
    ///
    /// Returns the index of the block expected to include it. The prediction
    /// is advisory: every submission before the next seal gets the same index.
    pub fn submit_transaction(&mut self, transaction: Transaction) -> u64 {
        self.pending.push(transaction);
        self.chain.len() as u64 + 1
    }

    /// Seal the pending pool into a new block and append it.
    ///
    /// The proof is not checked here; callers validate it first.
    /// `previous_hash` defaults to the digest of the current last block.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<Hash>) -> Block {
        let previous_hash = match previous_hash.or_else(|| self.last_block().map(Block::hash)) {
            Some(hash) => PreviousHash::Hash(hash),
            None => PreviousHash::Genesis,
        };
        let block = Block::new(
            self.chain.len() as u64 + 1,
            now_timestamp(),
            std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        );

        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            "block sealed"
        );
        self.chain.push(block.clone());
        block
    }

    /// Replace the chain if `candidate` is strictly longer than ours.
    ///
    /// The candidate must already be validated. The pending pool is kept.
    pub fn adopt_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.chain.len() {
            debug!(
                candidate = candidate.len(),
                current = self.chain.len(),
                "candidate no longer longer than local chain"
            );
            return false;
        }

        info!(from = self.chain.len(), to = candidate.len(), "chain replaced");
        self.chain = candidate;
        true
    }

    /// The most recent block, `None` only for a ledger without genesis
    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// All sealed blocks
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Number of sealed blocks
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false; a ledger holds at least its genesis block
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Transactions not yet sealed
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a node's ledger
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    /// Wrap a ledger for sharing between tasks
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Take the ledger lock.
    ///
    /// Every mutation completes inside one call, so a poisoned lock still
    /// guards consistent state and is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a transaction
    pub fn submit_transaction(&self, transaction: Transaction) -> u64 {
        let index = self.lock().submit_transaction(transaction);
        debug!(predicted_index = index, "transaction queued");
        index
    }

    /// Copy of the full chain
    pub fn chain(&self) -> Vec<Block> {
        self.lock().chain().to_vec()
    }

    /// Copy of the last block
    pub fn last_block(&self) -> Option<Block> {
        self.lock().last_block().cloned()
    }

    /// Current chain length
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Always false; see [`Ledger::is_empty`]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Atomically adopt a validated chain if it is still longer
    pub fn adopt_chain(&self, candidate: Vec<Block>) -> bool {
        self.lock().adopt_chain(candidate)
    }
}
