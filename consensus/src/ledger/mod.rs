//! Ledger reconciliation.
//!
//! Replays one address's credits and debits over the whole DAG in total order
//! and compares the resulting balance with what the UTXO set says the address
//! owns. A mismatch is reported, never corrected.

pub mod audit;
pub mod context;
pub mod errors;
pub mod reconcile;

pub use audit::{AuditEntry, BalanceDivergence, BlueState, Direction, ReconciliationReport, ScanWarning, UtxoAuditEntry};
pub use context::ScanContext;
pub use errors::{Corruption, LedgerError};
pub use reconcile::Reconciler;

use crate::consensus::storage::ChainStateView;
use consensus_core::address::Address;
use consensus_core::api::StandardAddressResolver;
use consensus_core::network::NetworkParams;

/// Reconciles `address` against one chain state view with the standard script resolver
pub fn reconcile(view: &ChainStateView<'_>, address: &Address, params: &NetworkParams) -> Result<ReconciliationReport, LedgerError> {
    Reconciler::new(view, view, view, StandardAddressResolver, params.clone()).reconcile(address)
}
