use thiserror::Error;

use crate::{tx::TransactionOutpoint, Hash};

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Invalid block version")]
    InvalidBlockVersion,

    #[error("Invalid coinbase transaction")]
    InvalidCoinbaseTransaction,

    #[error("Empty transaction list")]
    EmptyTransactionList,

    #[error("Merkle root does not match block transactions")]
    InvalidMerkleRoot,

    #[error("Block {0} not found")]
    BlockNotFound(Hash),

    #[error("Input spends missing or spent output {0}")]
    MissingUtxo(TransactionOutpoint),

    #[error("Output {0} spent twice in one block")]
    DoubleSpend(TransactionOutpoint),

    #[error("Input spends output {0} created outside the block's past")]
    UtxoOutsidePast(TransactionOutpoint),

    #[error("Input spends coinbase output {0} of a red block")]
    RedCoinbaseSpend(TransactionOutpoint),

    #[error("Invalid block parent {0}")]
    InvalidBlockParent(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Other error: {0}")]
    Other(String),
}
