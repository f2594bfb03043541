use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::ConsensusError;
use crate::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use crate::Hash;

/// Represents the changes caused by applying a block's transactions to the UTXO set.
/// `spent` contains the previous UTXO entries that were consumed (for undo).
/// `created` lists the outputs added by the block and still unspent after it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize, PartialEq, Eq)]
pub struct UtxoDiff {
    pub spent: Vec<(TransactionOutpoint, UtxoEntry)>,
    pub created: Vec<(TransactionOutpoint, UtxoEntry)>,
}

impl UtxoDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the diff of `transactions` accepted in block `block_hash`.
    ///
    /// `lookup` resolves outpoints against the set before the block. Outputs created
    /// earlier in the same block may be spent by later transactions. Fails on the
    /// first input that references a missing output or one already spent in this block.
    pub fn from_block<F>(transactions: &[Transaction], block_hash: Hash, mut lookup: F) -> Result<Self, ConsensusError>
    where
        F: FnMut(&TransactionOutpoint) -> Result<Option<UtxoEntry>, ConsensusError>,
    {
        let mut diff = Self::new();
        let mut consumed = HashSet::new();
        for tx in transactions {
            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    let outpoint = input.previous_outpoint;
                    if !consumed.insert(outpoint) {
                        return Err(ConsensusError::DoubleSpend(outpoint));
                    }
                    if let Some(pos) = diff.created.iter().position(|(created, _)| *created == outpoint) {
                        diff.created.swap_remove(pos);
                        continue;
                    }
                    match lookup(&outpoint)? {
                        Some(entry) if !entry.is_spent => diff.spent.push((outpoint, entry)),
                        _ => return Err(ConsensusError::MissingUtxo(outpoint)),
                    }
                }
            }
            for (index, output) in tx.outputs.iter().enumerate() {
                let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), block_hash, tx.is_coinbase());
                diff.created.push((tx.outpoint(index as u32), entry));
            }
        }
        Ok(diff)
    }
}
