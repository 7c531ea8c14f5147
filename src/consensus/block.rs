//! Block structure for the ledger
//!
//! Defines the block record, its link to the previous block, and the
//! canonical block digest.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::{canonical_json, hash_bytes, Hash};
use crate::ledger::Transaction;

/// Wire marker for the genesis block's previous hash
const GENESIS_MARKER: u64 = 1;

/// Link from a block to its predecessor
///
/// On the wire `Genesis` is the integer `1` and `Hash` a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousHash {
    /// The genesis block has no predecessor
    Genesis,
    /// Digest of the preceding block
    Hash(Hash),
}

impl fmt::Display for PreviousHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousHash::Genesis => write!(f, "genesis"),
            PreviousHash::Hash(hash) => write!(f, "{}", hash),
        }
    }
}

impl Serialize for PreviousHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PreviousHash::Genesis => serializer.serialize_u64(GENESIS_MARKER),
            PreviousHash::Hash(hash) => hash.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PreviousHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Marker(u64),
            Digest(Hash),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Marker(GENESIS_MARKER) => Ok(PreviousHash::Genesis),
            Repr::Marker(other) => Err(de::Error::custom(format!(
                "unexpected previous_hash marker {}",
                other
            ))),
            Repr::Digest(hash) => Ok(PreviousHash::Hash(hash)),
        }
    }
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 1 for genesis
    pub index: u64,
    /// Seconds since the Unix epoch when the block was sealed
    pub timestamp: f64,
    /// Transactions committed by this block, in submission order
    pub transactions: Vec<Transaction>,
    /// Proof of work relative to the previous block's proof
    pub proof: u64,
    /// Digest of the preceding block
    pub previous_hash: PreviousHash,
}

impl Block {
    /// Create a new block
    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: PreviousHash,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Canonical encoding used for hashing: compact JSON with sorted keys
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Encoding these fields cannot fail; a non-finite timestamp becomes `null`.
        canonical_json(self).unwrap_or_default()
    }

    /// Get the block digest
    pub fn hash(&self) -> Hash {
        hash_bytes(&self.canonical_bytes())
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == PreviousHash::Genesis
    }
}
