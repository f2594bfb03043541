use crate::cache::LruCache;
use crate::db::{DbReader, CF_BLOCKS};
use crate::{Database, DbResult};
use consensus_core::block::Block;
use consensus_core::Hash;
use rocksdb::WriteBatch;
use std::sync::Arc;

/// Block bodies keyed by block hash
pub struct BlockStore {
    db: Arc<Database>,
    cache: LruCache<Hash, Arc<Block>>,
}

impl BlockStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { db, cache: LruCache::new(cache_size) }
    }

    pub fn put_block(&self, batch: &mut WriteBatch, block: &Block) -> DbResult<()> {
        let serialized = bincode::serialize(block)?;
        self.db.put_in_batch(batch, CF_BLOCKS, block.hash().as_bytes(), &serialized)
    }

    /// Block bodies never change under a hash, so cached copies serve every reader.
    pub fn get_block<R: DbReader + ?Sized>(&self, reader: &R, hash: &Hash) -> DbResult<Option<Arc<Block>>> {
        reader.ensure_open()?;
        if let Some(block) = self.cache.get(hash) {
            return Ok(Some(block));
        }
        match reader.get(CF_BLOCKS, hash.as_bytes())? {
            Some(data) => {
                let block = Arc::new(bincode::deserialize::<Block>(&data)?);
                self.cache.insert(*hash, block.clone());
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    pub fn has_block<R: DbReader + ?Sized>(&self, reader: &R, hash: &Hash) -> DbResult<bool> {
        reader.exists(CF_BLOCKS, hash.as_bytes())
    }
}
