use crate::db::{DbReader, CF_TX_INDEX};
use crate::{Database, DbResult};
use consensus_core::block::Block;
use consensus_core::tx::TransactionId;
use consensus_core::Hash;
use rocksdb::WriteBatch;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Where an indexed transaction lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLocation {
    pub block_hash: Hash,
    pub index_in_block: u32,
}

/// Transaction id to containing block. The first block to index an id keeps it.
pub struct TxIndexStore {
    db: Arc<Database>,
}

impl TxIndexStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Indexes every transaction of `block` whose id is not indexed yet and
    /// returns how many were added.
    pub fn index_block<R: DbReader + ?Sized>(&self, reader: &R, batch: &mut WriteBatch, block: &Block) -> DbResult<usize> {
        let mut added = HashSet::new();
        for (index, tx) in block.transactions.iter().enumerate() {
            let id = tx.id();
            if added.contains(&id) || reader.exists(CF_TX_INDEX, id.as_bytes())? {
                warn!("transaction id {} already indexed, keeping the earlier location (block {})", id, block.hash());
                continue;
            }
            let location = TxLocation { block_hash: block.hash(), index_in_block: index as u32 };
            self.db.put_in_batch(batch, CF_TX_INDEX, id.as_bytes(), &bincode::serialize(&location)?)?;
            added.insert(id);
        }
        Ok(added.len())
    }

    pub fn get<R: DbReader + ?Sized>(&self, reader: &R, id: &TransactionId) -> DbResult<Option<TxLocation>> {
        match reader.get(CF_TX_INDEX, id.as_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }
}
