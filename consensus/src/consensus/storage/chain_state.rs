use crate::consensus::dag::BlockDag;
use crate::consensus::errors::DagError;
use consensus_core::api::{ChainStateProvider, TransactionLocator, UtxoIterator, UtxoSource};
use consensus_core::block::Block;
use consensus_core::block_index::{BlockId, BlockOrder, BlockRecord, BlockStatus};
use consensus_core::errors::ConsensusError;
use consensus_core::hashing::header::calc_work;
use consensus_core::network::NetworkParams;
use consensus_core::tx::{Transaction, TransactionId, TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::UtxoDiff;
use consensus_core::{Hash, KType};
use database::stores::{BlockIndexEntry, BlockIndexStore, BlockStore, MetadataStore, TxIndexStore, UtxoStore};
use database::{Database, DbError, DbSnapshot};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ChainStateError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("database belongs to network {stored}, configured for {configured}")]
    NetworkMismatch { stored: String, configured: String },

    #[error("database was built with GHOSTDAG k={stored}, configured k={configured}")]
    GhostdagKMismatch { stored: KType, configured: KType },

    #[error("block index entry {found} found where id {expected} was expected")]
    IndexMismatch { expected: BlockId, found: BlockId },
}

/// Maps a store failure into the error type of the query interfaces
pub(crate) fn db_to_consensus(err: DbError) -> ConsensusError {
    if err.is_decode_error() {
        ConsensusError::SerializationError(err.to_string())
    } else {
        ConsensusError::DatabaseError(err.to_string())
    }
}

/// Persistent chain state: stored blocks, the block index, the transaction
/// index and the UTXO set, plus the in-memory [`BlockDag`] derived from them.
///
/// Writers hold the DAG write lock across the database write, so a reader
/// holding the read lock and a snapshot sees both sides agree.
pub struct ChainState {
    db: Arc<Database>,
    dag: RwLock<BlockDag>,
    block_store: BlockStore,
    block_index: BlockIndexStore,
    tx_index: TxIndexStore,
    utxos: UtxoStore,
    metadata: MetadataStore,
    params: NetworkParams,
}

impl ChainState {
    /// Opens the chain state stored in `db`, creating the metadata of an
    /// empty writable database and rebuilding the DAG from the block index.
    pub fn open(db: Arc<Database>, params: NetworkParams, cache_size: usize) -> Result<Self, ChainStateError> {
        let state = Self {
            dag: RwLock::new(BlockDag::new(params.ghostdag_k)),
            block_store: BlockStore::new(db.clone(), cache_size),
            block_index: BlockIndexStore::new(db.clone()),
            tx_index: TxIndexStore::new(db.clone()),
            utxos: UtxoStore::new(db.clone()),
            metadata: MetadataStore::new(db.clone()),
            db,
            params,
        };
        state.check_metadata()?;
        state.load_dag()?;
        Ok(state)
    }

    fn check_metadata(&self) -> Result<(), ChainStateError> {
        let configured_network = self.params.network_type.to_string();
        let stored_network = self.metadata.network(&*self.db)?;
        let stored_k = self.metadata.ghostdag_k(&*self.db)?;

        if let Some(stored) = stored_network.as_ref() {
            if *stored != configured_network {
                return Err(ChainStateError::NetworkMismatch { stored: stored.clone(), configured: configured_network });
            }
        }
        if let Some(stored) = stored_k {
            if stored != self.params.ghostdag_k {
                return Err(ChainStateError::GhostdagKMismatch { stored, configured: self.params.ghostdag_k });
            }
        }

        if (stored_network.is_none() || stored_k.is_none()) && !self.db.is_read_only() {
            let mut batch = self.db.batch();
            self.metadata.set_network(&mut batch, &configured_network)?;
            self.metadata.set_ghostdag_k(&mut batch, self.params.ghostdag_k)?;
            self.db.write_batch(batch)?;
        }
        Ok(())
    }

    fn load_dag(&self) -> Result<(), ChainStateError> {
        let mut dag = self.dag.write();
        for (id, entry) in self.block_index.entries(&*self.db)? {
            let expected = dag.next_id();
            if id != expected {
                return Err(ChainStateError::IndexMismatch { expected, found: id });
            }
            dag.insert_block(entry.hash, &entry.parents, calc_work(entry.bits), entry.status)?;
        }
        dag.update_virtual()?;
        info!("loaded {} blocks, {} in the total order", dag.len(), dag.block_count());
        Ok(())
    }

    /// Accepts a block from chain sync.
    ///
    /// Structurally broken blocks and blocks that do not fit the DAG are
    /// rejected. A block is still stored and ordered, but marked known-invalid
    /// and kept out of the UTXO set and the transaction index, when one of its
    /// inputs is missing from the UTXO set, double spent, created outside the
    /// block's past, or a coinbase output of a block the new block sees as red.
    pub fn add_block(&self, block: &Block) -> Result<BlockId, ChainStateError> {
        block.validate()?;
        let hash = block.hash();

        let mut dag = self.dag.write();
        dag.check_insertable(&hash, &block.header.parents)?;

        let diff = match self.resolve_inputs(&dag, block)? {
            Ok(diff) => Some(diff),
            Err(err) => {
                warn!("block {} stored as invalid: {}", hash, err);
                None
            }
        };
        let status = if diff.is_some() { BlockStatus::valid() } else { BlockStatus::invalid() };

        let id = dag.next_id();
        let entry = BlockIndexEntry { hash, parents: block.header.parents.clone(), bits: block.header.bits, status };
        let mut batch = self.db.batch();
        self.block_store.put_block(&mut batch, block)?;
        self.block_index.put(&mut batch, id, &entry)?;
        if let Some(diff) = &diff {
            self.tx_index.index_block(&*self.db, &mut batch, block)?;
            self.utxos.apply_diff(&mut batch, diff)?;
        }
        self.db.write_batch(batch)?;

        let assigned = dag.add_block(hash, &block.header.parents, block.header.work(), status)?;
        debug!("accepted block {} as id {} ({})", hash, assigned, status);
        Ok(assigned)
    }

    /// Builds the block's UTXO diff against the outputs visible from its past.
    /// The inner error is the reason the block is invalid.
    fn resolve_inputs(&self, dag: &BlockDag, block: &Block) -> Result<Result<UtxoDiff, ConsensusError>, ChainStateError> {
        let past = dag.past_view(&block.header.parents)?;
        let mut resolved: HashMap<TransactionOutpoint, Option<UtxoEntry>> = HashMap::new();
        for input in block.transactions.iter().filter(|tx| !tx.is_coinbase()).flat_map(|tx| &tx.inputs) {
            let outpoint = input.previous_outpoint;
            if resolved.contains_key(&outpoint) {
                continue;
            }
            let entry = self.utxos.get_utxo(&*self.db, &outpoint)?;
            if let Some(entry) = &entry {
                if !past.contains(&entry.block_hash) {
                    return Ok(Err(ConsensusError::UtxoOutsidePast(outpoint)));
                }
                if entry.is_coinbase && past.is_blue(&entry.block_hash)? != Some(true) {
                    return Ok(Err(ConsensusError::RedCoinbaseSpend(outpoint)));
                }
            }
            resolved.insert(outpoint, entry);
        }

        match UtxoDiff::from_block(&block.transactions, block.hash(), |outpoint| Ok(resolved.get(outpoint).cloned().flatten())) {
            Ok(diff) => Ok(Ok(diff)),
            Err(err @ (ConsensusError::MissingUtxo(_) | ConsensusError::DoubleSpend(_))) => Ok(Err(err)),
            Err(err) => Err(err.into()),
        }
    }

    /// A consistent read view; concurrent [`Self::add_block`] calls wait until it is dropped
    pub fn read_view(&self) -> ChainStateView<'_> {
        let dag = self.dag.read();
        let snapshot = self.db.snapshot();
        ChainStateView { state: self, dag, snapshot }
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Closes the underlying database. Outstanding views fail on their next read.
    pub fn close(&self) {
        self.db.close();
    }
}

/// Snapshot of the chain state: the DAG as of acquisition together with a
/// database snapshot taken under the same lock.
pub struct ChainStateView<'a> {
    state: &'a ChainState,
    dag: RwLockReadGuard<'a, BlockDag>,
    snapshot: DbSnapshot<'a>,
}

impl ChainStateView<'_> {
    pub fn dag(&self) -> &BlockDag {
        &self.dag
    }

    pub fn params(&self) -> &NetworkParams {
        &self.state.params
    }

    pub fn block(&self, hash: &Hash) -> Result<Option<Arc<Block>>, ConsensusError> {
        self.state.block_store.get_block(&self.snapshot, hash).map_err(db_to_consensus)
    }

    pub fn utxo_count(&self) -> Result<usize, ConsensusError> {
        self.state.utxos.count(&self.snapshot).map_err(db_to_consensus)
    }
}

impl ChainStateProvider for ChainStateView<'_> {
    fn block_count(&self) -> u64 {
        self.dag.block_count()
    }

    fn block_by_order(&self, order: BlockOrder) -> Option<BlockRecord> {
        self.dag.block_by_order(order).cloned()
    }

    fn block_by_id(&self, id: BlockId) -> Option<BlockRecord> {
        self.dag.block_by_id(id).cloned()
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<BlockRecord> {
        self.dag.block_by_hash(hash).cloned()
    }

    fn confirmations(&self, id: BlockId) -> Option<u64> {
        self.dag.confirmations(id)
    }

    fn is_blue(&self, id: BlockId) -> Option<bool> {
        self.dag.is_blue(id)
    }

    fn main_chain_tip(&self) -> Option<BlockRecord> {
        self.dag.main_chain_tip().cloned()
    }

    fn block_transactions(&self, hash: &Hash) -> Result<Option<Vec<Transaction>>, ConsensusError> {
        Ok(self.block(hash)?.map(|block| block.transactions.clone()))
    }
}

impl TransactionLocator for ChainStateView<'_> {
    fn find_transaction(&self, id: &TransactionId) -> Result<Option<(Transaction, Hash)>, ConsensusError> {
        let Some(location) = self.state.tx_index.get(&self.snapshot, id).map_err(db_to_consensus)? else {
            return Ok(None);
        };
        let block = self.block(&location.block_hash)?.ok_or(ConsensusError::BlockNotFound(location.block_hash))?;
        let tx = block.transactions.get(location.index_in_block as usize).cloned().ok_or_else(|| {
            ConsensusError::Other(format!(
                "indexed transaction {} not at position {} of block {}",
                id, location.index_in_block, location.block_hash
            ))
        })?;
        Ok(Some((tx, location.block_hash)))
    }
}

impl UtxoSource for ChainStateView<'_> {
    fn utxo_entries(&self) -> Result<UtxoIterator<'_>, ConsensusError> {
        let records = self.state.utxos.iter(&self.snapshot).map_err(db_to_consensus)?;
        Ok(Box::new(records.map(|record| record.map_err(db_to_consensus))))
    }
}
