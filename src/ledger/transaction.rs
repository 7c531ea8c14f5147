//! Ledger transaction record
//!
//! Transactions carry no signatures and no balance semantics: the ledger
//! records whatever the caller submits.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::constants::{MINING_REWARD, REWARD_SENDER};

/// A single transfer recorded in a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender identifier
    pub sender: String,
    /// Recipient identifier
    pub recipient: String,
    /// Amount, kept as a JSON number so its textual form hashes stably
    pub amount: Number,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// Create the mining reward paid to `recipient`
    pub fn reward(recipient: impl Into<String>) -> Self {
        Self::new(REWARD_SENDER, recipient, MINING_REWARD)
    }

    /// Whether this is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
