//! Mining module - Proof search and block sealing

mod miner;

pub use miner::*;
