//! Block index records: dense ids, DAG position and status facts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Hash;

/// Dense block identifier, assigned in acceptance order starting at 0 (genesis)
pub type BlockId = u64;

/// Position of a block in the total order
pub type BlockOrder = u64;

/// A single fact about a block. Facts are orthogonal, any combination may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockStatusFlag {
    /// The block body is stored
    DataStored,
    /// Transactions were checked against the UTXO set
    Validated,
    /// The block failed validation; its transactions never affect balances
    KnownInvalid,
}

/// Set of [`BlockStatusFlag`]s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BlockStatus {
    data_stored: bool,
    validated: bool,
    known_invalid: bool,
}

impl BlockStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: BlockStatusFlag) -> Self {
        self.set(flag);
        self
    }

    pub fn set(&mut self, flag: BlockStatusFlag) {
        *self.slot(flag) = true;
    }

    pub fn has(&self, flag: BlockStatusFlag) -> bool {
        match flag {
            BlockStatusFlag::DataStored => self.data_stored,
            BlockStatusFlag::Validated => self.validated,
            BlockStatusFlag::KnownInvalid => self.known_invalid,
        }
    }

    fn slot(&mut self, flag: BlockStatusFlag) -> &mut bool {
        match flag {
            BlockStatusFlag::DataStored => &mut self.data_stored,
            BlockStatusFlag::Validated => &mut self.validated,
            BlockStatusFlag::KnownInvalid => &mut self.known_invalid,
        }
    }

    pub fn is_known_invalid(&self) -> bool {
        self.known_invalid
    }

    pub fn is_valid(&self) -> bool {
        self.validated && !self.known_invalid
    }

    /// Status of a stored block that passed validation
    pub fn valid() -> Self {
        Self::new().with(BlockStatusFlag::DataStored).with(BlockStatusFlag::Validated)
    }

    /// Status of a stored block that failed validation
    pub fn invalid() -> Self {
        Self::new().with(BlockStatusFlag::DataStored).with(BlockStatusFlag::KnownInvalid)
    }

    pub fn flags(&self) -> impl Iterator<Item = BlockStatusFlag> + '_ {
        [BlockStatusFlag::DataStored, BlockStatusFlag::Validated, BlockStatusFlag::KnownInvalid].into_iter().filter(|f| self.has(*f))
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.known_invalid {
            f.write_str("invalid")
        } else if self.validated {
            f.write_str("valid")
        } else {
            f.write_str("pending")
        }
    }
}

/// Everything the block index knows about one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub hash: Hash,
    pub parents: Vec<BlockId>,
    /// Longest parent path from genesis
    pub height: u64,
    pub status: BlockStatus,
    /// `None` while the block is not placed in the total order
    pub order: Option<BlockOrder>,
}

impl BlockRecord {
    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_orthogonal() {
        let mut status = BlockStatus::new().with(BlockStatusFlag::DataStored);
        assert!(status.has(BlockStatusFlag::DataStored));
        assert!(!status.is_known_invalid());
        status.set(BlockStatusFlag::KnownInvalid);
        assert!(status.is_known_invalid());
        assert!(status.has(BlockStatusFlag::DataStored));
        assert!(!status.is_valid());
        assert_eq!(status.flags().count(), 2);
    }

    #[test]
    fn test_named_constructors() {
        assert!(BlockStatus::valid().is_valid());
        assert!(BlockStatus::invalid().is_known_invalid());
        assert_eq!(BlockStatus::invalid().to_string(), "invalid");
    }
}
