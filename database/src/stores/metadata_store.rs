use crate::db::{DbReader, CF_METADATA};
use crate::{Database, DbError, DbResult};
use consensus_core::KType;
use rocksdb::WriteBatch;
use std::sync::Arc;

const KEY_NETWORK: &str = "network";
const KEY_GHOSTDAG_K: &str = "ghostdag_k";

/// Chain-wide settings the database was created with
pub struct MetadataStore {
    db: Arc<Database>,
}

impl MetadataStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn put(&self, batch: &mut WriteBatch, key: &str, value: &[u8]) -> DbResult<()> {
        self.db.put_in_batch(batch, CF_METADATA, key.as_bytes(), value)
    }

    pub fn get<R: DbReader + ?Sized>(&self, reader: &R, key: &str) -> DbResult<Option<Vec<u8>>> {
        reader.get(CF_METADATA, key.as_bytes())
    }

    pub fn set_network(&self, batch: &mut WriteBatch, network: &str) -> DbResult<()> {
        self.put(batch, KEY_NETWORK, network.as_bytes())
    }

    pub fn network<R: DbReader + ?Sized>(&self, reader: &R) -> DbResult<Option<String>> {
        self.get(reader, KEY_NETWORK)?
            .map(|bytes| String::from_utf8(bytes).map_err(|e| DbError::InvalidData(e.to_string())))
            .transpose()
    }

    pub fn set_ghostdag_k(&self, batch: &mut WriteBatch, k: KType) -> DbResult<()> {
        self.put(batch, KEY_GHOSTDAG_K, &k.to_le_bytes())
    }

    pub fn ghostdag_k<R: DbReader + ?Sized>(&self, reader: &R) -> DbResult<Option<KType>> {
        self.get(reader, KEY_GHOSTDAG_K)?
            .map(|bytes| {
                let bytes: [u8; 4] = bytes.as_slice().try_into().map_err(|_| DbError::InvalidData("ghostdag k".to_string()))?;
                Ok(KType::from_le_bytes(bytes))
            })
            .transpose()
    }
}
