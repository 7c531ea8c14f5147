//! HTTP handlers
//!
//! Each handler validates the request shape, calls into [`Node`], and renders
//! JSON. Malformed input never reaches the ledger.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number};
use thiserror::Error;

use crate::consensus::{Block, PeerChain};
use crate::ledger::Transaction;
use crate::mining::MiningError;
use crate::node::Node;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing values: {0}")]
    MissingValues(String),
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Please supply a valid list of nodes")]
    NoNodes,
    #[error(transparent)]
    Mining(#[from] MiningError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingValues(_) | ApiError::Malformed(_) | ApiError::NoNodes => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Mining(MiningError::Worker(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Mining(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Body of `POST /transactions/new`; every field is required
#[derive(Debug, Deserialize)]
pub struct NewTransaction {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<Number>,
}

impl NewTransaction {
    fn into_transaction(self) -> Result<Transaction, ApiError> {
        let missing: Vec<&str> = [
            ("sender", self.sender.is_none()),
            ("recipient", self.recipient.is_none()),
            ("amount", self.amount.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (self.sender, self.recipient, self.amount) {
            (Some(sender), Some(recipient), Some(amount)) => {
                Ok(Transaction::new(sender, recipient, amount))
            }
            _ => Err(ApiError::MissingValues(missing.join(", "))),
        }
    }
}

/// Response of `POST /transactions/new`
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionAccepted {
    pub message: String,
    pub predicted_block_index: u64,
}

/// Response of `GET /mine`
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockForged {
    pub message: String,
    #[serde(flatten)]
    pub block: Block,
}

/// Body of `POST /nodes/register`
#[derive(Debug, Deserialize)]
pub struct RegisterNodes {
    pub nodes: Option<Vec<String>>,
}

/// Response of `POST /nodes/register`
#[derive(Debug, Serialize, Deserialize)]
pub struct NodesRegistered {
    pub message: String,
    pub total_nodes: Vec<String>,
    pub rejected: Vec<String>,
}

/// `POST /transactions/new`
pub async fn new_transaction(
    State(node): State<Arc<Node>>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionAccepted>), ApiError> {
    let Json(request) = payload?;
    let transaction = request.into_transaction()?;
    let index = node.submit_transaction(transaction);

    Ok((
        StatusCode::CREATED,
        Json(TransactionAccepted {
            message: format!("Transaction will be added to Block {}", index),
            predicted_block_index: index,
        }),
    ))
}

/// `GET /mine`
pub async fn mine(State(node): State<Arc<Node>>) -> Result<Json<BlockForged>, ApiError> {
    let block = node.mine().await?;
    Ok(Json(BlockForged {
        message: "New Block Forged".to_string(),
        block,
    }))
}

/// `GET /chain`
pub async fn full_chain(State(node): State<Arc<Node>>) -> Json<PeerChain> {
    Json(PeerChain::new(node.ledger().chain()))
}

/// `POST /nodes/register`
pub async fn register_nodes(
    State(node): State<Arc<Node>>,
    payload: Result<Json<RegisterNodes>, JsonRejection>,
) -> Result<(StatusCode, Json<NodesRegistered>), ApiError> {
    let Json(request) = payload?;
    let addresses = request.nodes.filter(|nodes| !nodes.is_empty()).ok_or(ApiError::NoNodes)?;
    let rejected = node.register_nodes(addresses.iter().map(String::as_str));

    Ok((
        StatusCode::CREATED,
        Json(NodesRegistered {
            message: "New nodes have been added".to_string(),
            total_nodes: node.nodes(),
            rejected,
        }),
    ))
}

/// `GET /nodes`
pub async fn list_nodes(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    Json(json!({ "nodes": node.nodes() }))
}

/// `GET /nodes/resolve`
pub async fn resolve_nodes(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    let resolution = node.resolve_conflicts().await;
    let body = if resolution.replaced {
        json!({ "message": "Our chain was replaced", "new_chain": resolution.chain })
    } else {
        json!({ "message": "Our chain is authoritative", "chain": resolution.chain })
    };
    Json(body)
}
