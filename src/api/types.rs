// Wire type definitions.
//
// The JSON schema is stable; field renames are part of the contract with the
// graph frontend.

use serde::{Deserialize, Serialize};

use crate::collapse::{CollapsedEdge, Edge};

/// One rendered address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub cnt: i64,
    pub picked: bool,
    #[serde(rename = "type")]
    pub node_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphResponse {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollapsedGraphResponse {
    pub nodes: Vec<Node>,
    pub edges: Vec<CollapsedEdge>,
}

/// Query string of `GET /orb/eth/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQuery {
    pub depth: Option<u32>,
    #[serde(rename = "fromBlock")]
    pub from_block: Option<u64>,
    #[serde(rename = "toBlock")]
    pub to_block: Option<u64>,
    pub flow: Option<String>,
    pub algo: Option<String>,
    #[serde(rename = "collapseTrxs")]
    pub collapse_trxs: Option<String>,
}

/// Query string of `GET /orb/eth/paths/{addressFrom}/to/{addressTo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsQuery {
    #[serde(rename = "fromBlock")]
    pub from_block: Option<u64>,
    #[serde(rename = "toBlock")]
    pub to_block: Option<u64>,
}
