//! GHOSTDAG k-cluster coloring: selected parent choice, mergeset ordering
//! and the blue/red split of each block's mergeset.

pub mod protocol;
pub mod stores;

pub use protocol::GhostdagProtocol;
pub use stores::{GhostdagData, GhostdagStore};
