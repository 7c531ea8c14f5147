//! Peer chain fetching
//!
//! Pulls `GET /chain` from every registered peer concurrently. Each fetch is
//! bounded by a timeout and a response size cap; failures only drop that
//! peer's candidate.

use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::consensus::PeerChain;
use crate::p2p::PeerError;

/// Default per-peer deadline
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on a peer's `/chain` response body
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// HTTP client for peer chains
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
    timeout: Duration,
    max_response_bytes: usize,
}

impl PeerClient {
    /// Create a client with the given per-peer limits
    pub fn new(timeout: Duration, max_response_bytes: usize) -> Result<Self, PeerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PeerError::Client(err.to_string()))?;
        Ok(Self {
            http,
            timeout,
            max_response_bytes,
        })
    }

    /// Fetch one peer's chain
    pub async fn fetch_chain(&self, node: &str) -> Result<PeerChain, PeerError> {
        let url = format!("http://{}/chain", node);
        let fetch = async {
            let mut response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|err| PeerError::Unreachable(err.to_string()))?;

            if !response.status().is_success() {
                return Err(PeerError::BadStatus(response.status().as_u16()));
            }
            if response
                .content_length()
                .is_some_and(|len| len > self.max_response_bytes as u64)
            {
                return Err(PeerError::ResponseTooLarge(self.max_response_bytes));
            }

            let mut body = Vec::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|err| PeerError::Unreachable(err.to_string()))?
            {
                if body.len() + chunk.len() > self.max_response_bytes {
                    return Err(PeerError::ResponseTooLarge(self.max_response_bytes));
                }
                body.extend_from_slice(&chunk);
            }

            serde_json::from_slice::<PeerChain>(&body)
                .map_err(|err| PeerError::Malformed(err.to_string()))
        };

        tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| PeerError::TimedOut(self.timeout))?
    }

    /// Fetch every peer's chain concurrently, dropping failures
    pub async fn fetch_all(&self, nodes: Vec<String>) -> Vec<PeerChain> {
        let mut tasks = JoinSet::new();
        for node in nodes {
            let client = self.clone();
            tasks.spawn(async move {
                let result = client.fetch_chain(&node).await;
                (node, result)
            });
        }

        let mut chains = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((node, Ok(chain))) => {
                    debug!(peer = %node, length = chain.length, "fetched peer chain");
                    chains.push(chain);
                }
                Ok((node, Err(err))) => warn!(peer = %node, %err, "skipping peer"),
                Err(err) => warn!(%err, "peer fetch task failed"),
            }
        }
        chains
    }
}

impl Default for PeerClient {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: DEFAULT_PEER_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}
