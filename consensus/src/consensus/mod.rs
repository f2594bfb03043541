//! Block DAG bookkeeping: relations, GHOSTDAG coloring, linearization and the
//! persistent chain state built on top of them.

pub mod dag;
pub mod errors;
pub mod ghostdag;
pub mod storage;

pub use dag::{BlockDag, BlockRelations, Reachability};
pub use errors::DagError;
pub use ghostdag::{GhostdagData, GhostdagProtocol, GhostdagStore};
pub use storage::{ChainState, ChainStateError, ChainStateView};
