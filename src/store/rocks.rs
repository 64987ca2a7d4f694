use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};

use super::{AddressLabels, BlockStore, StoreError};
use crate::constants::ADDRESS_BLOCKS_CAP;

pub const COLUMN_FAMILIES: [&str; 4] = ["blocks", "addr_blocks", "addr_degree", "addr_labels"];

/// RocksDB-backed [`BlockStore`].
///
/// Layout:
/// - `blocks`:      decimal block number -> transaction blob
/// - `addr_blocks`: address -> little-endian u64 block numbers, newest first
/// - `addr_degree`: address -> little-endian i64
/// - `addr_labels`: address -> JSON [`AddressLabels`]
///
/// RocksDB gets are blocking, so every read hops onto the blocking pool.
pub struct RocksBlockStore {
    db: Arc<DB>,
}

impl RocksBlockStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        db_options.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_options, path, cf_descriptors)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    async fn get_cf(&self, cf: &'static str, key: String) -> Result<Option<Vec<u8>>, StoreError> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let handle = db
                .cf_handle(cf)
                .ok_or_else(|| StoreError::Backend(format!("{} CF not found", cf)))?;
            db.get_cf(&handle, key.as_bytes())
                .map_err(|e| StoreError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

#[async_trait]
impl BlockStore for RocksBlockStore {
    async fn address_blocks(&self, addr: &str) -> Result<Vec<u64>, StoreError> {
        let raw = match self.get_cf("addr_blocks", addr.to_string()).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        if raw.len() % 8 != 0 {
            return Err(StoreError::Corrupt {
                key: addr.to_string(),
                reason: format!("block list length {} is not a multiple of 8", raw.len()),
            });
        }
        Ok(raw
            .chunks_exact(8)
            .take(ADDRESS_BLOCKS_CAP)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                u64::from_le_bytes(bytes)
            })
            .collect())
    }

    async fn block(&self, number: u64) -> Result<Option<String>, StoreError> {
        let raw = match self.get_cf("blocks", number.to_string()).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let blob = String::from_utf8(raw).map_err(|e| StoreError::Corrupt {
            key: number.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(blob))
    }

    async fn address_degree(&self, addr: &str) -> Result<i64, StoreError> {
        let raw = match self.get_cf("addr_degree", addr.to_string()).await? {
            Some(raw) => raw,
            None => return Ok(0),
        };
        let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| StoreError::Corrupt {
            key: addr.to_string(),
            reason: format!("degree value has {} bytes, want 8", raw.len()),
        })?;
        Ok(i64::from_le_bytes(bytes))
    }

    async fn address_labels(&self, addr: &str) -> Result<Option<AddressLabels>, StoreError> {
        let raw = match self.get_cf("addr_labels", addr.to_string()).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let labels = serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            key: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(labels))
    }
}
