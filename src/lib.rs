//! Proof-of-work ledger core library
//!
//! An append-only transaction ledger replicated across nodes. Blocks are
//! gated by proof of work and divergence is settled by the longest valid
//! chain.

pub mod consensus;
pub mod crypto;
pub mod ledger;
pub mod mining;
pub mod node;
pub mod p2p;
pub mod rpc;

/// Protocol constants
pub mod constants {
    /// Proof stored in every genesis block
    pub const GENESIS_PROOF: u64 = 100;

    /// Sender recorded on mining rewards
    pub const REWARD_SENDER: &str = "0";

    /// Amount paid for each mined block
    pub const MINING_REWARD: u64 = 1;
}
