//! Chain state for a GHOSTDAG block DAG and the ledger reconciliation engine.
//!
//! [`consensus`] holds the DAG relations, GHOSTDAG coloring, the block index
//! with its total order, and the persistent [`ChainState`]. [`ledger`] replays
//! one address's history in DAG order and checks it against the UTXO set.

pub mod consensus;
pub mod ledger;

pub use consensus_core::Hash;
pub use consensus::dag::{BlockDag, BlockRelations, Reachability};
pub use consensus::errors::DagError;
pub use consensus::ghostdag::{GhostdagData, GhostdagProtocol, GhostdagStore};
pub use consensus::storage::{ChainState, ChainStateError, ChainStateView};
pub use ledger::{reconcile, LedgerError, ReconciliationReport, Reconciler};
