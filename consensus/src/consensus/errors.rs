use consensus_core::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    #[error("block {0} is already in the DAG")]
    DuplicateBlock(Hash),

    #[error("block {block} references unknown parent {parent}")]
    UnknownParent { block: Hash, parent: Hash },

    #[error("block {0} has no parents but the DAG already has a genesis")]
    MultipleGenesis(Hash),

    #[error("no GHOSTDAG data for block {0}")]
    MissingGhostdagData(Hash),

    #[error("blue anticone size of block {0} is not recorded on the selected chain")]
    MissingAnticoneSize(Hash),
}
