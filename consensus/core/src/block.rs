use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    constants::BLOCK_VERSION,
    errors::ConsensusError,
    hashing,
    header::Header,
    tx::{Transaction, COINBASE_TRANSACTION_INDEX},
    Hash,
};

/// Complete block structure including header and transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block header containing metadata and parent information
    pub header: Header,
    /// List of transactions in the block, coinbase first
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a new block with the given header and transactions
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    /// Builds a block committing to `transactions` through the header merkle root
    pub fn from_transactions(parents: Vec<Hash>, timestamp: u64, bits: u32, nonce: u64, transactions: Vec<Transaction>) -> Self {
        let merkle_root = calc_merkle_root(&transactions);
        let header = Header::new_finalized(BLOCK_VERSION, parents, merkle_root, timestamp, bits, nonce);
        Self { header, transactions }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.get(COINBASE_TRANSACTION_INDEX).filter(|tx| tx.is_coinbase())
    }

    /// Checks structure only: version, merkle commitment and coinbase placement
    pub fn validate(&self) -> Result<(), ConsensusError> {
        if self.header.version != BLOCK_VERSION {
            return Err(ConsensusError::InvalidBlockVersion);
        }
        if self.transactions.is_empty() {
            return Err(ConsensusError::EmptyTransactionList);
        }
        if calc_merkle_root(&self.transactions) != self.header.hash_merkle_root {
            return Err(ConsensusError::InvalidMerkleRoot);
        }
        if self.coinbase().is_none() || self.transactions[1..].iter().any(|tx| tx.is_coinbase()) {
            return Err(ConsensusError::InvalidCoinbaseTransaction);
        }
        Ok(())
    }
}

/// Merkle root over the transaction ids
pub fn calc_merkle_root(transactions: &[Transaction]) -> Hash {
    let ids: Vec<Hash> = transactions.iter().map(|tx| tx.id()).collect();
    hashing::merkle_root(&ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::MIN_DIFFICULTY_BITS, subnets::SUBNETWORK_ID_COINBASE};

    fn coinbase(payload: &[u8]) -> Transaction {
        Transaction::new(0, vec![], vec![], 0, SUBNETWORK_ID_COINBASE, 0, payload.to_vec())
    }

    #[test]
    fn test_valid_block() {
        let block = Block::from_transactions(vec![], 1, MIN_DIFFICULTY_BITS, 0, vec![coinbase(b"0")]);
        assert!(block.validate().is_ok());
        assert!(block.coinbase().is_some());
    }

    #[test]
    fn test_second_coinbase_rejected() {
        let block = Block::from_transactions(vec![], 1, MIN_DIFFICULTY_BITS, 0, vec![coinbase(b"0"), coinbase(b"1")]);
        assert!(matches!(block.validate(), Err(ConsensusError::InvalidCoinbaseTransaction)));
    }

    #[test]
    fn test_merkle_mismatch_rejected() {
        let mut block = Block::from_transactions(vec![], 1, MIN_DIFFICULTY_BITS, 0, vec![coinbase(b"0")]);
        block.transactions[0] = coinbase(b"other");
        assert!(matches!(block.validate(), Err(ConsensusError::InvalidMerkleRoot)));
    }
}
