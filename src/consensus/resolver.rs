//! Longest-valid-chain conflict resolution
//!
//! A candidate replaces the local chain only if it is strictly longer than
//! every chain seen so far (starting from our own length) and passes full
//! validation. This trusts proof-of-work cost, nothing more: a sufficiently
//! resourced adversary can still present a longer valid chain.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consensus::{validate_chain, Block};

/// A chain as reported by a peer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerChain {
    /// Length the peer claims
    pub length: u64,
    /// The peer's blocks
    pub chain: Vec<Block>,
}

impl PeerChain {
    /// Wrap a chain, reporting its true length
    pub fn new(chain: Vec<Block>) -> Self {
        Self {
            length: chain.len() as u64,
            chain,
        }
    }
}

/// Outcome of a resolution round
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Whether a peer chain won
    pub replaced: bool,
    /// The winning chain (our own when `replaced` is false)
    pub chain: Vec<Block>,
}

/// Pick the longest valid chain among `own` and `candidates`.
///
/// Empty candidates and candidates whose reported length does not match the
/// number of blocks they carry are skipped.
pub fn resolve(own: &[Block], candidates: Vec<PeerChain>) -> Resolution {
    let mut best_length = own.len() as u64;
    let mut best: Option<Vec<Block>> = None;

    for candidate in candidates {
        if candidate.chain.is_empty() {
            debug!("skipping empty candidate chain");
            continue;
        }
        if candidate.length != candidate.chain.len() as u64 {
            debug!(
                reported = candidate.length,
                actual = candidate.chain.len(),
                "skipping candidate with mismatched length"
            );
            continue;
        }
        if candidate.length <= best_length {
            continue;
        }
        if let Err(err) = validate_chain(&candidate.chain) {
            debug!(length = candidate.length, %err, "skipping invalid candidate");
            continue;
        }

        best_length = candidate.length;
        best = Some(candidate.chain);
    }

    match best {
        Some(chain) => {
            info!(length = chain.len(), "found longer valid chain");
            Resolution {
                replaced: true,
                chain,
            }
        }
        None => Resolution {
            replaced: false,
            chain: own.to_vec(),
        },
    }
}
