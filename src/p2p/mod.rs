//! P2P module - Peer registry and peer chain fetching

mod peer;
mod client;

pub use peer::*;
pub use client::*;

use std::time::Duration;
use thiserror::Error;

/// Peer errors
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Invalid peer address: {0:?}")]
    InvalidAddress(String),
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("Peer unreachable: {0}")]
    Unreachable(String),
    #[error("Peer answered with status {0}")]
    BadStatus(u16),
    #[error("Peer response exceeds {0} bytes")]
    ResponseTooLarge(usize),
    #[error("Malformed peer response: {0}")]
    Malformed(String),
    #[error("Peer did not answer within {0:?}")]
    TimedOut(Duration),
}
