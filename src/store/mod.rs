// Read-only access to the indexed chain data.
//
// The indexer process owns all writes; this side consumes four views of its
// output: per-block transaction blobs, per-address block lists, per-address
// degree counters, and enrichment labels. Absent keys are data, not errors.

pub mod memory;
pub mod rocks;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reading from the backing store. Misses never produce this:
/// lookups return empty data for absent keys.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend: {0}")]
    Backend(String),

    #[error("corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Labels attached to an address by the enrichment pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressLabels {
    /// Display name, e.g. "Coinbase 1".
    pub prime: String,
    /// Coarse category, e.g. "Exchange".
    #[serde(rename = "type")]
    pub label_type: String,
    /// Everything else the labeler knows.
    pub secondary: Vec<String>,
}

/// Read-only view of the indexed chain data the engine traverses.
///
/// Implementations must be safe for concurrent reads; every call may suspend
/// on I/O. All operations are idempotent.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Block numbers the address participated in, newest first, truncated to
    /// [`crate::constants::ADDRESS_BLOCKS_CAP`] entries per call. Callers
    /// treat the result as an unordered set.
    async fn address_blocks(&self, addr: &str) -> Result<Vec<u64>, StoreError>;

    /// Raw transaction blob for a block; `None` when the block is unknown.
    async fn block(&self, number: u64) -> Result<Option<String>, StoreError>;

    /// Cached transaction count for an address, 0 when unknown.
    async fn address_degree(&self, addr: &str) -> Result<i64, StoreError>;

    /// Enrichment labels, when the labeler has seen the address.
    async fn address_labels(&self, addr: &str) -> Result<Option<AddressLabels>, StoreError>;
}
