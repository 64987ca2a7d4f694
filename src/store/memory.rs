use std::collections::HashMap;

use async_trait::async_trait;

use super::{AddressLabels, BlockStore, StoreError};
use crate::constants::ADDRESS_BLOCKS_CAP;

/// HashMap-backed [`BlockStore`] for unit tests and local development.
/// Built fixture-style: chain `with_*` calls, then hand it to the engine.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: HashMap<u64, String>,
    addr_blocks: HashMap<String, Vec<u64>>,
    degrees: HashMap<String, i64>,
    labels: HashMap<String, AddressLabels>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, number: u64, blob: &str) -> Self {
        self.blocks.insert(number, blob.to_string());
        self
    }

    pub fn with_address_blocks(mut self, addr: &str, blocks: &[u64]) -> Self {
        self.addr_blocks.insert(addr.to_string(), blocks.to_vec());
        self
    }

    pub fn with_degree(mut self, addr: &str, degree: i64) -> Self {
        self.degrees.insert(addr.to_string(), degree);
        self
    }

    pub fn with_labels(mut self, addr: &str, labels: AddressLabels) -> Self {
        self.labels.insert(addr.to_string(), labels);
        self
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn address_blocks(&self, addr: &str) -> Result<Vec<u64>, StoreError> {
        let mut blocks = self.addr_blocks.get(addr).cloned().unwrap_or_default();
        blocks.truncate(ADDRESS_BLOCKS_CAP);
        Ok(blocks)
    }

    async fn block(&self, number: u64) -> Result<Option<String>, StoreError> {
        Ok(self.blocks.get(&number).cloned())
    }

    async fn address_degree(&self, addr: &str) -> Result<i64, StoreError> {
        Ok(self.degrees.get(addr).copied().unwrap_or(0))
    }

    async fn address_labels(&self, addr: &str) -> Result<Option<AddressLabels>, StoreError> {
        Ok(self.labels.get(addr).cloned())
    }
}
