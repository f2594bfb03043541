//! Core consensus types shared by the storage, DAG and ledger layers.
//!
//! Everything here is plain data plus the narrow query traits (see [`api`])
//! through which the ledger reconciliation engine reads chain state.

pub mod address;
pub mod api;
pub mod block;
pub mod block_index;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod header;
pub mod network;
pub mod script;
pub mod subnets;
pub mod tx;
pub mod utxo;

use std::collections::{HashMap, HashSet};

pub use crypto_hashes::Hash;

/// Accumulated proof-of-work of a set of blue blocks
pub type BlueWorkType = primitive_types::U256;

/// Type of the GHOSTDAG `k` parameter
pub type KType = u32;

pub type BlockHashMap<V> = HashMap<Hash, V>;
pub type BlockHashSet = HashSet<Hash>;

pub const ZERO_HASH: Hash = Hash::zeroed();
