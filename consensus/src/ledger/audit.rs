use consensus_core::address::Address;
use consensus_core::block_index::{BlockId, BlockOrder, BlockStatus};
use consensus_core::network::NetworkType;
use consensus_core::tx::{TransactionId, TransactionOutpoint};
use consensus_core::Hash;
use serde::Serialize;
use std::fmt;

/// Blue/red classification of the block an entry comes from, as seen by the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlueState {
    Blue,
    Red,
    /// Not classified, or not consulted because the block is known invalid
    Undetermined,
}

impl From<Option<bool>> for BlueState {
    fn from(is_blue: Option<bool>) -> Self {
        match is_blue {
            Some(true) => BlueState::Blue,
            Some(false) => BlueState::Red,
            None => BlueState::Undetermined,
        }
    }
}

impl fmt::Display for BlueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlueState::Blue => write!(f, "blue"),
            BlueState::Red => write!(f, "red"),
            BlueState::Undetermined => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Credit,
    Debit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => write!(f, "in"),
            Direction::Debit => write!(f, "out"),
        }
    }
}

/// One credit or debit of the target address, in scan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub block_id: BlockId,
    pub block_hash: Hash,
    pub block_order: BlockOrder,
    pub height: u64,
    pub status: BlockStatus,
    /// Informational only, never gates the balance
    pub confirmations: u64,
    pub blue_state: BlueState,
    pub tx_id: TransactionId,
    pub tx_full_hash: Hash,
    /// Credits: the created output. Debits: the spent output.
    pub outpoint: TransactionOutpoint,
    /// Position of the input or output inside the scanned transaction
    pub io_index: u32,
    pub direction: Direction,
    pub amount: u64,
    pub is_coinbase: bool,
    /// The transaction index agrees with the scanned transaction
    pub tx_valid: bool,
    /// Whether the entry moved the running balance
    pub counted: bool,
    pub balance_after: i64,
}

impl AuditEntry {
    pub fn signed_amount(&self) -> i64 {
        let amount = i64::try_from(self.amount).unwrap_or(i64::MAX);
        match self.direction {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        }
    }

    /// Contribution rule of the ledger side: red coinbase credits never count,
    /// otherwise the transaction must be index-consistent and its block not
    /// known invalid.
    pub fn contributes(&self) -> bool {
        if self.is_coinbase && self.direction == Direction::Credit && self.blue_state == BlueState::Red {
            return false;
        }
        self.tx_valid && !self.status.is_known_invalid()
    }
}

/// One unspent output resolving to the target address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoAuditEntry {
    pub outpoint: TransactionOutpoint,
    pub amount: u64,
    pub block_hash: Hash,
    pub block_order: Option<BlockOrder>,
    pub is_coinbase: bool,
    pub blue_state: BlueState,
    pub counted: bool,
}

/// Skipped items worth reporting alongside the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScanWarning {
    /// An output paying more than one address
    AmbiguousScript { block_hash: Hash, outpoint: TransactionOutpoint, address_count: usize },
    /// A UTXO record whose block is not placed in the total order
    UnorderedUtxoBlock { outpoint: TransactionOutpoint, block_hash: Hash },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::AmbiguousScript { block_hash, outpoint, address_count } => {
                write!(f, "output {} in block {} pays {} addresses, skipped", outpoint, block_hash, address_count)
            }
            ScanWarning::UnorderedUtxoBlock { outpoint, block_hash } => {
                write!(f, "utxo {} belongs to unordered block {}, skipped", outpoint, block_hash)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceDivergence {
    pub ledger_balance: i64,
    pub utxo_balance: u64,
}

impl BalanceDivergence {
    /// Ledger minus UTXO balance
    pub fn delta(&self) -> i128 {
        self.ledger_balance as i128 - self.utxo_balance as i128
    }
}

impl fmt::Display for BalanceDivergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger balance {} != utxo balance {} (delta {})", self.ledger_balance, self.utxo_balance, self.delta())
    }
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub address: Address,
    pub network: NetworkType,
    pub tip_hash: Option<Hash>,
    pub tip_order: Option<BlockOrder>,
    pub block_count: u64,
    pub entries: Vec<AuditEntry>,
    pub ledger_balance: i64,
    pub utxo_entries: Vec<UtxoAuditEntry>,
    pub utxo_balance: u64,
    pub warnings: Vec<ScanWarning>,
}

impl ReconciliationReport {
    pub fn divergence(&self) -> Option<BalanceDivergence> {
        let divergence = BalanceDivergence { ledger_balance: self.ledger_balance, utxo_balance: self.utxo_balance };
        (divergence.delta() != 0).then_some(divergence)
    }

    pub fn is_consistent(&self) -> bool {
        self.divergence().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(direction: Direction, is_coinbase: bool, blue_state: BlueState, tx_valid: bool, status: BlockStatus) -> AuditEntry {
        AuditEntry {
            block_id: 0,
            block_hash: Hash::from_u64_word(1),
            block_order: 0,
            height: 0,
            status,
            confirmations: 0,
            blue_state,
            tx_id: Hash::from_u64_word(2),
            tx_full_hash: Hash::from_u64_word(3),
            outpoint: TransactionOutpoint::new(Hash::from_u64_word(2), 0),
            io_index: 0,
            direction,
            amount: 10,
            is_coinbase,
            tx_valid,
            counted: false,
            balance_after: 0,
        }
    }

    #[test]
    fn test_contribution_rules() {
        let valid = BlockStatus::valid();
        assert!(entry(Direction::Credit, false, BlueState::Red, true, valid).contributes());
        assert!(!entry(Direction::Credit, true, BlueState::Red, true, valid).contributes());
        assert!(entry(Direction::Credit, true, BlueState::Blue, true, valid).contributes());
        assert!(!entry(Direction::Debit, false, BlueState::Blue, false, valid).contributes());
        assert!(!entry(Direction::Credit, false, BlueState::Undetermined, true, BlockStatus::invalid()).contributes());
        assert_eq!(entry(Direction::Debit, false, BlueState::Blue, true, valid).signed_amount(), -10);
    }

    #[test]
    fn test_blue_state_from_classifier() {
        assert_eq!(BlueState::from(Some(true)), BlueState::Blue);
        assert_eq!(BlueState::from(Some(false)), BlueState::Red);
        assert_eq!(BlueState::from(None), BlueState::Undetermined);
    }
}
