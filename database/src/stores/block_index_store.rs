use crate::db::{DbReader, CF_BLOCK_INDEX};
use crate::{Database, DbError, DbResult};
use consensus_core::block_index::{BlockId, BlockStatus};
use consensus_core::Hash;
use rocksdb::WriteBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Persisted part of a block record. Order, height and coloring are derived on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndexEntry {
    pub hash: Hash,
    pub parents: Vec<Hash>,
    /// Difficulty bits of the header, the source of the block's work
    pub bits: u32,
    pub status: BlockStatus,
}

/// Block index keyed by big-endian block id, so iteration follows id order
pub struct BlockIndexStore {
    db: Arc<Database>,
}

impl BlockIndexStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn put(&self, batch: &mut WriteBatch, id: BlockId, entry: &BlockIndexEntry) -> DbResult<()> {
        self.db.put_in_batch(batch, CF_BLOCK_INDEX, &id.to_be_bytes(), &bincode::serialize(entry)?)
    }

    pub fn get<R: DbReader + ?Sized>(&self, reader: &R, id: BlockId) -> DbResult<Option<BlockIndexEntry>> {
        match reader.get(CF_BLOCK_INDEX, &id.to_be_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// All entries in ascending id order
    pub fn entries<R: DbReader + ?Sized>(&self, reader: &R) -> DbResult<Vec<(BlockId, BlockIndexEntry)>> {
        reader
            .iter(CF_BLOCK_INDEX)?
            .map(|item| {
                let (key, value) = item?;
                let id_bytes: [u8; 8] =
                    key[..].try_into().map_err(|_| DbError::InvalidData(format!("block index key of {} bytes", key.len())))?;
                Ok((BlockId::from_be_bytes(id_bytes), bincode::deserialize(&value)?))
            })
            .collect()
    }
}
