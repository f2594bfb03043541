//! Persistent chain state over the RocksDB stores.

pub mod chain_state;

pub use chain_state::{ChainState, ChainStateError, ChainStateView};
