//! Ledger module - Transactions, the chain, and the pending pool

mod transaction;
mod state;

pub use transaction::*;
pub use state::*;
