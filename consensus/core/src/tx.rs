//!
//! # Transaction
//!
//! This module implements consensus [`Transaction`] structure and related types.
//!

mod script_public_key;

use borsh::{BorshDeserialize, BorshSerialize};
pub use script_public_key::{scriptvec, ScriptPublicKey, ScriptPublicKeyVersion, ScriptVec, SCRIPT_VECTOR_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    hashing,
    subnets::{self, SubnetworkId},
    Hash,
};

/// COINBASE_TRANSACTION_INDEX is the index of the coinbase transaction in every block
pub const COINBASE_TRANSACTION_INDEX: usize = 0;

/// A 32-byte transaction identifier (the short hash, see [`Transaction::id`]).
pub type TransactionId = crate::Hash;

/// Holds details about an individual transaction output in a utxo
/// set such as whether or not it was contained in a coinbase tx, the block
/// which created it, its public key script, and how much it pays.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoEntry {
    pub amount: u64,
    pub script_public_key: ScriptPublicKey,
    /// Hash of the block whose transaction created this output
    pub block_hash: Hash,
    pub is_coinbase: bool,
    /// Stores that delete on spend never set this, but external sets may flag instead of removing
    #[serde(default)]
    pub is_spent: bool,
}

impl UtxoEntry {
    pub fn new(amount: u64, script_public_key: ScriptPublicKey, block_hash: Hash, is_coinbase: bool) -> Self {
        Self { amount, script_public_key, block_hash, is_coinbase, is_spent: false }
    }

    pub fn spent(mut self) -> Self {
        self.is_spent = true;
        self
    }
}

pub type TransactionIndexType = u32;

/// Represents a transaction outpoint
#[derive(Eq, Default, Hash, PartialEq, Debug, Copy, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutpoint {
    pub transaction_id: TransactionId,
    pub index: TransactionIndexType,
}

impl TransactionOutpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

impl Display for TransactionOutpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.transaction_id, self.index)
    }
}

/// Represents a transaction input
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub previous_outpoint: TransactionOutpoint,
    pub signature_script: Vec<u8>,
    pub sequence: u64,
    pub sig_op_count: u8,
}

impl TransactionInput {
    pub fn new(previous_outpoint: TransactionOutpoint, signature_script: Vec<u8>, sequence: u64, sig_op_count: u8) -> Self {
        Self { previous_outpoint, signature_script, sequence, sig_op_count }
    }
}

impl std::fmt::Debug for TransactionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionInput")
            .field("previous_outpoint", &self.previous_outpoint)
            .field("signature_script", &hex::encode(&self.signature_script))
            .field("sequence", &self.sequence)
            .field("sig_op_count", &self.sig_op_count)
            .finish()
    }
}

/// Represents a transaction output
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub value: u64,
    pub script_public_key: ScriptPublicKey,
}

impl TransactionOutput {
    pub fn new(value: u64, script_public_key: ScriptPublicKey) -> Self {
        Self { value, script_public_key }
    }
}

/// Represents a transaction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub version: u16,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u64,
    pub subnetwork_id: SubnetworkId,
    pub gas: u64,
    pub payload: Vec<u8>,

    // A field that is used to cache the transaction ID.
    // Always use the corresponding self.id() instead of accessing this field directly
    id: TransactionId,
}

impl Transaction {
    pub fn new(
        version: u16,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u64,
        subnetwork_id: SubnetworkId,
        gas: u64,
        payload: Vec<u8>,
    ) -> Self {
        let mut tx = Self::new_non_finalized(version, inputs, outputs, lock_time, subnetwork_id, gas, payload);
        tx.finalize();
        tx
    }

    pub fn new_non_finalized(
        version: u16,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u64,
        subnetwork_id: SubnetworkId,
        gas: u64,
        payload: Vec<u8>,
    ) -> Self {
        Self { version, inputs, outputs, lock_time, subnetwork_id, gas, payload, id: Default::default() }
    }

    /// Determines whether or not a transaction is a coinbase transaction. A coinbase
    /// transaction is a special transaction created by miners that pays the block
    /// reward and has no real inputs.
    pub fn is_coinbase(&self) -> bool {
        self.subnetwork_id == subnets::SUBNETWORK_ID_COINBASE
    }

    /// Recompute and finalize the tx id based on updated tx fields
    pub fn finalize(&mut self) {
        self.id = hashing::tx::id(self);
    }

    /// Returns the transaction ID. Signature scripts are not committed to.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Hash over every field, signature scripts included. Distinguishes
    /// transactions that collide on [`Transaction::id`].
    pub fn full_hash(&self) -> Hash {
        hashing::tx::full_hash(self)
    }

    /// Outpoint of the output at `index` of this transaction
    pub fn outpoint(&self, index: TransactionIndexType) -> TransactionOutpoint {
        TransactionOutpoint::new(self.id, index)
    }
}

impl AsRef<Transaction> for Transaction {
    fn as_ref(&self) -> &Transaction {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnets::SUBNETWORK_ID_NATIVE;

    fn spend(sig: Vec<u8>) -> Transaction {
        Transaction::new(
            0,
            vec![TransactionInput::new(TransactionOutpoint::new(Hash::from_u64_word(7), 1), sig, 0, 1)],
            vec![TransactionOutput::new(10, ScriptPublicKey::from_vec(0, vec![0x51]))],
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    #[test]
    fn test_id_ignores_signature_scripts() {
        let a = spend(vec![1, 2, 3]);
        let b = spend(vec![4, 5]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.full_hash(), b.full_hash());
    }

    #[test]
    fn test_id_commits_to_outputs() {
        let a = spend(vec![]);
        let mut b = a.clone();
        b.outputs[0].value = 11;
        b.finalize();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_coinbase_detection() {
        let tx = Transaction::new(0, vec![], vec![], 0, subnets::SUBNETWORK_ID_COINBASE, 0, vec![]);
        assert!(tx.is_coinbase());
        assert!(!spend(vec![]).is_coinbase());
    }
}
