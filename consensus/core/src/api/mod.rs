//! Read-only query interfaces the ledger reconciliation engine consumes.
//!
//! Implementations are expected to answer every call from one consistent
//! snapshot of chain state for as long as the implementing value lives.

use crate::{
    address::Address,
    block_index::{BlockId, BlockOrder, BlockRecord},
    errors::ConsensusError,
    network::NetworkParams,
    script::{extract_script_addresses, ScriptError},
    tx::{ScriptPublicKey, Transaction, TransactionId, TransactionOutpoint, UtxoEntry},
    Hash,
};

/// Iterator over UTXO records as produced by [`UtxoSource::utxo_entries`]
pub type UtxoIterator<'a> = Box<dyn Iterator<Item = Result<(TransactionOutpoint, UtxoEntry), ConsensusError>> + 'a>;

/// Block index plus the DAG order/classifier
pub trait ChainStateProvider {
    /// Number of blocks placed in the total order
    fn block_count(&self) -> u64;

    /// The block at position `order`, for `order` in `0..block_count()`
    fn block_by_order(&self, order: BlockOrder) -> Option<BlockRecord>;

    fn block_by_id(&self, id: BlockId) -> Option<BlockRecord>;

    fn block_by_hash(&self, hash: &Hash) -> Option<BlockRecord>;

    /// Number of blocks in the future of `id`; zero for tips
    fn confirmations(&self, id: BlockId) -> Option<u64>;

    /// `Some(true)` for blue, `Some(false)` for red, `None` when not yet classified
    fn is_blue(&self, id: BlockId) -> Option<bool>;

    fn main_chain_tip(&self) -> Option<BlockRecord>;

    /// Full transaction list of a stored block, `None` when the body is missing
    fn block_transactions(&self, hash: &Hash) -> Result<Option<Vec<Transaction>>, ConsensusError>;
}

/// Transaction index lookups
pub trait TransactionLocator {
    /// The indexed transaction with this id together with the hash of the block containing it
    fn find_transaction(&self, id: &TransactionId) -> Result<Option<(Transaction, Hash)>, ConsensusError>;
}

/// Ordered iteration over the unspent output set
pub trait UtxoSource {
    fn utxo_entries(&self) -> Result<UtxoIterator<'_>, ConsensusError>;
}

/// Maps output scripts to destination addresses
pub trait ScriptAddressResolver {
    fn extract_addresses(&self, script: &ScriptPublicKey, params: &NetworkParams) -> Result<Vec<Address>, ScriptError>;
}

/// Resolver backed by the standard template matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAddressResolver;

impl ScriptAddressResolver for StandardAddressResolver {
    fn extract_addresses(&self, script: &ScriptPublicKey, params: &NetworkParams) -> Result<Vec<Address>, ScriptError> {
        Ok(extract_script_addresses(script.script(), params)?.addresses)
    }
}

impl<T: ChainStateProvider + ?Sized> ChainStateProvider for &T {
    fn block_count(&self) -> u64 {
        (**self).block_count()
    }

    fn block_by_order(&self, order: BlockOrder) -> Option<BlockRecord> {
        (**self).block_by_order(order)
    }

    fn block_by_id(&self, id: BlockId) -> Option<BlockRecord> {
        (**self).block_by_id(id)
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<BlockRecord> {
        (**self).block_by_hash(hash)
    }

    fn confirmations(&self, id: BlockId) -> Option<u64> {
        (**self).confirmations(id)
    }

    fn is_blue(&self, id: BlockId) -> Option<bool> {
        (**self).is_blue(id)
    }

    fn main_chain_tip(&self) -> Option<BlockRecord> {
        (**self).main_chain_tip()
    }

    fn block_transactions(&self, hash: &Hash) -> Result<Option<Vec<Transaction>>, ConsensusError> {
        (**self).block_transactions(hash)
    }
}

impl<T: TransactionLocator + ?Sized> TransactionLocator for &T {
    fn find_transaction(&self, id: &TransactionId) -> Result<Option<(Transaction, Hash)>, ConsensusError> {
        (**self).find_transaction(id)
    }
}

impl<T: UtxoSource + ?Sized> UtxoSource for &T {
    fn utxo_entries(&self) -> Result<UtxoIterator<'_>, ConsensusError> {
        (**self).utxo_entries()
    }
}

impl<T: ScriptAddressResolver + ?Sized> ScriptAddressResolver for &T {
    fn extract_addresses(&self, script: &ScriptPublicKey, params: &NetworkParams) -> Result<Vec<Address>, ScriptError> {
        (**self).extract_addresses(script, params)
    }
}
