//! Genesis block generation
//!
//! Every node stamps its own genesis block at startup, so genesis blocks
//! differ between nodes only by timestamp.

use crate::consensus::{Block, PreviousHash};
use crate::constants::GENESIS_PROOF;

/// Create the genesis block sealed at `timestamp`
pub fn genesis_block(timestamp: f64) -> Block {
    Block::new(1, timestamp, Vec::new(), GENESIS_PROOF, PreviousHash::Genesis)
}
