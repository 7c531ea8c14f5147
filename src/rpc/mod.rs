//! HTTP API module
//!
//! REST interface for clients submitting transactions and for peers fetching
//! chains.

mod handlers;
mod server;

pub use handlers::*;
pub use server::*;
