use crate::consensus::errors::DagError;
use consensus_core::{BlockHashMap, BlueWorkType, Hash, KType, ZERO_HASH};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// GHOSTDAG consensus data for a single block
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GhostdagData {
    /// Number of blue blocks in the past, informational
    pub blue_score: u64,

    /// Accumulated work of the blue past plus the block's own work
    pub blue_work: BlueWorkType,

    /// Parent with the highest (blue work, hash). `ZERO_HASH` for genesis.
    pub selected_parent: Hash,

    /// Mergeset without the selected parent, ascending by (blue work, hash)
    pub mergeset: Vec<Hash>,

    /// Blue part of the mergeset; the selected parent comes first
    pub mergeset_blues: Vec<Hash>,

    pub mergeset_reds: Vec<Hash>,

    /// Blue anticone sizes of the mergeset blues and of every blue they affected
    pub blues_anticone_sizes: BlockHashMap<KType>,
}

impl GhostdagData {
    pub fn new_with_selected_parent(selected_parent: Hash, k: KType) -> Self {
        let mut mergeset_blues = Vec::with_capacity(k as usize + 1);
        mergeset_blues.push(selected_parent);
        let mut blues_anticone_sizes = BlockHashMap::with_capacity(k as usize);
        blues_anticone_sizes.insert(selected_parent, 0);
        Self {
            blue_score: 0,
            blue_work: BlueWorkType::zero(),
            selected_parent,
            mergeset: Vec::new(),
            mergeset_blues,
            mergeset_reds: Vec::new(),
            blues_anticone_sizes,
        }
    }

    pub fn genesis(work: BlueWorkType) -> Self {
        Self {
            blue_score: 0,
            blue_work: work,
            selected_parent: ZERO_HASH,
            mergeset: Vec::new(),
            mergeset_blues: Vec::new(),
            mergeset_reds: Vec::new(),
            blues_anticone_sizes: BlockHashMap::new(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.selected_parent == ZERO_HASH
    }

    pub fn add_blue(&mut self, block: Hash, blue_anticone_size: KType, affected: &BlockHashMap<KType>) {
        self.mergeset_blues.push(block);
        self.blues_anticone_sizes.insert(block, blue_anticone_size);
        for (blue, size) in affected {
            self.blues_anticone_sizes.insert(*blue, size + 1);
        }
    }

    pub fn add_red(&mut self, block: Hash) {
        self.mergeset_reds.push(block);
    }

    pub fn is_mergeset_blue(&self, block: &Hash) -> bool {
        self.mergeset_blues.contains(block)
    }

    pub fn mergeset_size(&self) -> usize {
        self.mergeset_blues.len() + self.mergeset_reds.len()
    }
}

/// GHOSTDAG data and header work per block
#[derive(Default)]
pub struct GhostdagStore {
    data: BlockHashMap<Arc<GhostdagData>>,
    work: BlockHashMap<BlueWorkType>,
}

impl GhostdagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: Hash, data: GhostdagData, work: BlueWorkType) {
        self.data.insert(hash, Arc::new(data));
        self.work.insert(hash, work);
    }

    pub fn get(&self, hash: &Hash) -> Result<Arc<GhostdagData>, DagError> {
        self.data.get(hash).cloned().ok_or(DagError::MissingGhostdagData(*hash))
    }

    pub fn blue_work(&self, hash: &Hash) -> Result<BlueWorkType, DagError> {
        self.data.get(hash).map(|d| d.blue_work).ok_or(DagError::MissingGhostdagData(*hash))
    }

    /// Work claimed by the block's own header
    pub fn block_work(&self, hash: &Hash) -> Result<BlueWorkType, DagError> {
        self.work.get(hash).copied().ok_or(DagError::MissingGhostdagData(*hash))
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.data.contains_key(hash)
    }
}
