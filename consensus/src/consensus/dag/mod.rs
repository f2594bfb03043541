//! DAG management: parent/child relations, reachability queries and the
//! ordered, colored block index built on GHOSTDAG.

pub mod block_dag;
pub mod reachability;
pub mod relations;

pub use block_dag::BlockDag;
pub use reachability::Reachability;
pub use relations::BlockRelations;
