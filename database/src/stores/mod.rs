pub mod block_index_store;
pub mod block_store;
pub mod metadata_store;
pub mod tx_index_store;
pub mod utxo_store;

pub use block_index_store::{BlockIndexEntry, BlockIndexStore};
pub use block_store::BlockStore;
pub use metadata_store::MetadataStore;
pub use tx_index_store::{TxIndexStore, TxLocation};
pub use utxo_store::UtxoStore;
