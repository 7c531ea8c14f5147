//! Chain validation
//!
//! Pure functions checking structural and proof-of-work integrity of a
//! chain. Transactions are not inspected.

use thiserror::Error;
use tracing::debug;

use crate::consensus::{valid_proof, Block, PreviousHash};

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Chain is empty")]
    EmptyChain,
    #[error("Invalid genesis block")]
    InvalidGenesis,
    #[error("Block {index} does not follow block {previous}")]
    IndexGap { previous: u64, index: u64 },
    #[error("Invalid previous hash in block {index}")]
    InvalidPrevHash { index: u64 },
    #[error("Invalid proof of work in block {index}")]
    InvalidPoW { index: u64 },
}

/// Validate that `block` correctly extends `previous`
pub fn validate_link(previous: &Block, block: &Block) -> Result<(), ValidationError> {
    if previous.index.checked_add(1) != Some(block.index) {
        return Err(ValidationError::IndexGap {
            previous: previous.index,
            index: block.index,
        });
    }

    if block.previous_hash != PreviousHash::Hash(previous.hash()) {
        return Err(ValidationError::InvalidPrevHash { index: block.index });
    }

    if !valid_proof(previous.proof, block.proof) {
        return Err(ValidationError::InvalidPoW { index: block.index });
    }

    Ok(())
}

/// Validate a whole chain, stopping at the first violation
pub fn validate_chain(chain: &[Block]) -> Result<(), ValidationError> {
    let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
    if genesis.index != 1 || !genesis.is_genesis() {
        return Err(ValidationError::InvalidGenesis);
    }

    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        if let Err(err) = validate_link(previous, block) {
            debug!(index = block.index, %err, "chain rejected");
            return Err(err);
        }
    }

    Ok(())
}

/// Boolean form of [`validate_chain`]
pub fn is_valid_chain(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::proof_of_work;
    use crate::ledger::{Ledger, Transaction};

    fn mined_chain(blocks: usize) -> Vec<Block> {
        let mut ledger = Ledger::new();
        for i in 0..blocks {
            ledger.submit_transaction(Transaction::new("a", "b", i as u64));
            let proof = proof_of_work(ledger.last_block().unwrap().proof);
            ledger.seal_block(proof, None);
        }
        ledger.chain().to_vec()
    }

    #[test]
    fn test_genesis_only_is_valid() {
        assert!(is_valid_chain(&mined_chain(0)));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        assert_eq!(validate_chain(&mined_chain(3)), Ok(()));
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_eq!(validate_chain(&[]), Err(ValidationError::EmptyChain));
    }

    #[test]
    fn test_tampered_previous_hash_rejected() {
        let mut chain = mined_chain(2);
        chain[2].previous_hash = PreviousHash::Hash(chain[0].hash());
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::InvalidPrevHash { index: 3 })
        );
    }

    #[test]
    fn test_tampered_transactions_break_link() {
        let mut chain = mined_chain(2);
        chain[1].transactions.push(Transaction::new("x", "y", 1_000u64));
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::InvalidPrevHash { index: 3 })
        );
    }

    #[test]
    fn test_bad_proof_rejected() {
        let mut chain = mined_chain(1);
        chain[1].proof = 0;
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::InvalidPoW { index: 2 })
        );
    }

    #[test]
    fn test_index_gap_rejected() {
        let mut chain = mined_chain(1);
        chain[1].index = 5;
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::IndexGap { previous: 1, index: 5 })
        );
    }

    #[test]
    fn test_non_genesis_first_block_rejected() {
        let chain = mined_chain(2);
        assert_eq!(
            validate_chain(&chain[1..]),
            Err(ValidationError::InvalidGenesis)
        );
    }
}
