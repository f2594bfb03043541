use consensus_core::block_index::BlockOrder;
use consensus_core::errors::ConsensusError;
use consensus_core::script::ScriptError;
use consensus_core::tx::{TransactionId, TransactionOutpoint};
use consensus_core::Hash;
use thiserror::Error;

/// Ways the chain state can contradict itself during a scan
#[derive(Error, Debug)]
pub enum Corruption {
    #[error("no block record at order {order} of {block_count}")]
    MissingOrderedBlock { order: BlockOrder, block_count: u64 },

    #[error("block {0} has no stored body")]
    MissingBlockBody(Hash),

    #[error("block {0} has no confirmation count")]
    MissingConfirmations(Hash),

    #[error("utxo {outpoint} references unknown block {block}")]
    MissingOriginBlock { outpoint: TransactionOutpoint, block: Hash },

    #[error("transaction {tx} (scanned in block {block}) could not be fetched from the index: {source}")]
    Locator { tx: TransactionId, block: Hash, source: ConsensusError },

    #[error("reading block {block} failed: {source}")]
    BlockRead { block: Hash, source: ConsensusError },
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("index corruption: {0}")]
    IndexCorruption(#[from] Corruption),

    #[error("cannot decode script of output {output_index} of tx {tx} in block {block}: {source}")]
    ScriptDecode { block: Hash, tx: TransactionId, output_index: u32, source: ScriptError },

    #[error("malformed utxo record: {0}")]
    UtxoDecode(String),

    #[error("chain state read failed: {0}")]
    Store(ConsensusError),
}

impl LedgerError {
    /// Store failures stay `Store`; anything else the store reports means its
    /// contents disagree with each other
    pub(crate) fn from_read(err: ConsensusError, corruption: impl FnOnce(ConsensusError) -> Corruption) -> Self {
        match err {
            ConsensusError::DatabaseError(_) => LedgerError::Store(err),
            other => LedgerError::IndexCorruption(corruption(other)),
        }
    }

    pub(crate) fn from_utxo_read(err: ConsensusError) -> Self {
        match err {
            ConsensusError::SerializationError(msg) => LedgerError::UtxoDecode(msg),
            other => LedgerError::Store(other),
        }
    }
}
