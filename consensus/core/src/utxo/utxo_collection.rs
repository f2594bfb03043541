use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::UtxoSource;
use crate::errors::ConsensusError;
use crate::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use crate::utxo::UtxoDiff;
use crate::Hash;

/// A simple in-memory UTXO collection.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UtxoCollection {
    utxos: HashMap<TransactionOutpoint, UtxoEntry>,
}

impl UtxoCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self { utxos: HashMap::new() }
    }

    /// Returns true if the outpoint exists in the set
    pub fn contains(&self, outpoint: &TransactionOutpoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    /// Get a reference to a UTXO entry
    pub fn get(&self, outpoint: &TransactionOutpoint) -> Option<&UtxoEntry> {
        self.utxos.get(outpoint)
    }

    /// Insert a new UTXO entry (overwrites if exists)
    pub fn insert(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) {
        self.utxos.insert(outpoint, entry);
    }

    /// Remove and return an entry
    pub fn remove(&mut self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        self.utxos.remove(outpoint)
    }

    /// Applies all transactions of a block. On error the collection is left untouched.
    pub fn apply_block(&mut self, transactions: &[Transaction], block_hash: Hash) -> Result<UtxoDiff, ConsensusError> {
        let diff = UtxoDiff::from_block(transactions, block_hash, |outpoint| Ok(self.get(outpoint).cloned()))?;
        self.apply_diff(&diff);
        Ok(diff)
    }

    fn apply_diff(&mut self, diff: &UtxoDiff) {
        for (outpoint, _) in &diff.spent {
            self.remove(outpoint);
        }
        for (outpoint, entry) in &diff.created {
            self.insert(*outpoint, entry.clone());
        }
    }
}

impl UtxoSource for UtxoCollection {
    fn utxo_entries(&self) -> Result<crate::api::UtxoIterator<'_>, ConsensusError> {
        let mut entries: Vec<_> = self.utxos.iter().map(|(o, e)| (*o, e.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Box::new(entries.into_iter().map(Ok)))
    }
}

impl FromIterator<(TransactionOutpoint, UtxoEntry)> for UtxoCollection {
    fn from_iter<T: IntoIterator<Item = (TransactionOutpoint, UtxoEntry)>>(iter: T) -> Self {
        Self { utxos: iter.into_iter().collect() }
    }
}
