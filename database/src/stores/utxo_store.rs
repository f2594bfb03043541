use crate::db::{DbReader, CF_UTXOS};
use crate::{Database, DbError, DbResult};
use consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use rocksdb::WriteBatch;
use std::sync::Arc;

const OUTPOINT_KEY_SIZE: usize = 32 + 4;

pub type UtxoRecordIterator<'a> = Box<dyn Iterator<Item = DbResult<(TransactionOutpoint, UtxoEntry)>> + 'a>;

/// The unspent output set. Spent outputs are deleted.
pub struct UtxoStore {
    db: Arc<Database>,
}

impl UtxoStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get_utxo<R: DbReader + ?Sized>(&self, reader: &R, outpoint: &TransactionOutpoint) -> DbResult<Option<UtxoEntry>> {
        match reader.get(CF_UTXOS, &outpoint_to_key(outpoint))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn apply_diff(&self, batch: &mut WriteBatch, diff: &UtxoDiff) -> DbResult<()> {
        for (outpoint, _) in &diff.spent {
            self.db.delete_in_batch(batch, CF_UTXOS, &outpoint_to_key(outpoint))?;
        }
        for (outpoint, entry) in &diff.created {
            self.db.put_in_batch(batch, CF_UTXOS, &outpoint_to_key(outpoint), &bincode::serialize(entry)?)?;
        }
        Ok(())
    }

    /// Every record in outpoint key order
    pub fn iter<'a, R: DbReader + ?Sized>(&self, reader: &'a R) -> DbResult<UtxoRecordIterator<'a>> {
        Ok(Box::new(reader.iter(CF_UTXOS)?.map(|item| {
            let (key, value) = item?;
            let outpoint = key_to_outpoint(&key)?;
            Ok((outpoint, bincode::deserialize(&value)?))
        })))
    }

    pub fn count<R: DbReader + ?Sized>(&self, reader: &R) -> DbResult<usize> {
        let mut count = 0usize;
        for item in reader.iter(CF_UTXOS)? {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

fn outpoint_to_key(outpoint: &TransactionOutpoint) -> Vec<u8> {
    let mut key = outpoint.transaction_id.as_bytes().to_vec();
    key.extend_from_slice(&outpoint.index.to_le_bytes());
    key
}

fn key_to_outpoint(key: &[u8]) -> DbResult<TransactionOutpoint> {
    if key.len() != OUTPOINT_KEY_SIZE {
        return Err(DbError::InvalidData(format!("utxo key of {} bytes", key.len())));
    }
    let (id, index) = key.split_at(32);
    let transaction_id = Hash::try_from_slice(id).map_err(|e| DbError::InvalidData(e.to_string()))?;
    let index = u32::from_le_bytes(index.try_into().map_err(|_| DbError::InvalidData("utxo key index".to_string()))?);
    Ok(TransactionOutpoint::new(transaction_id, index))
}
