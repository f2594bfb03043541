use super::{BlockRelations, Reachability};
use crate::consensus::errors::DagError;
use crate::consensus::ghostdag::{GhostdagData, GhostdagProtocol, GhostdagStore};
use consensus_core::block_index::{BlockId, BlockOrder, BlockRecord, BlockStatus};
use consensus_core::{BlockHashMap, BlueWorkType, Hash, KType, ZERO_HASH};
use std::sync::Arc;
use tracing::{debug, trace};

/// Block index together with the GHOSTDAG linearization and coloring.
///
/// Ids are dense and assigned in insertion order. Order positions and colors
/// are recomputed from the virtual block (whose parents are all current tips)
/// on every [`BlockDag::update_virtual`].
pub struct BlockDag {
    records: Vec<BlockRecord>,
    ids: BlockHashMap<BlockId>,
    relations: BlockRelations,
    ghostdag_store: GhostdagStore,
    protocol: GhostdagProtocol,
    /// Position -> block id
    order: Vec<BlockId>,
    /// Blue/red relative to the virtual block, by id
    colors: Vec<Option<bool>>,
    virtual_data: Option<Arc<GhostdagData>>,
}

impl BlockDag {
    pub fn new(k: KType) -> Self {
        Self {
            records: Vec::new(),
            ids: BlockHashMap::new(),
            relations: BlockRelations::new(),
            ghostdag_store: GhostdagStore::new(),
            protocol: GhostdagProtocol::new(k),
            order: Vec::new(),
            colors: Vec::new(),
            virtual_data: None,
        }
    }

    pub fn k(&self) -> KType {
        self.protocol.k()
    }

    /// Id the next inserted block will get
    pub fn next_id(&self) -> BlockId {
        self.records.len() as BlockId
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.ids.contains_key(hash)
    }

    /// Checks that a block with these parents could be inserted
    pub fn check_insertable(&self, hash: &Hash, parents: &[Hash]) -> Result<(), DagError> {
        if self.contains(hash) {
            return Err(DagError::DuplicateBlock(*hash));
        }
        if parents.is_empty() && !self.records.is_empty() {
            return Err(DagError::MultipleGenesis(*hash));
        }
        if let Some(parent) = parents.iter().find(|p| !self.contains(p)) {
            return Err(DagError::UnknownParent { block: *hash, parent: *parent });
        }
        Ok(())
    }

    /// Inserts a block without touching the current order. The block stays
    /// unordered and unclassified until the next [`Self::update_virtual`].
    pub fn insert_block(&mut self, hash: Hash, parents: &[Hash], work: BlueWorkType, status: BlockStatus) -> Result<BlockId, DagError> {
        self.check_insertable(&hash, parents)?;

        let unique_parents = dedup_parents(parents);
        let data = self.protocol.ghostdag(&self.relations, &self.ghostdag_store, &unique_parents, work)?;
        let parent_ids = unique_parents.iter().map(|p| self.ids[p]).collect();
        let height = self.relations.add_block(hash, unique_parents);
        trace!("block {} selected parent {} blue score {}", hash, data.selected_parent, data.blue_score);
        self.ghostdag_store.insert(hash, data, work);

        let id = self.next_id();
        self.records.push(BlockRecord { id, hash, parents: parent_ids, height, status, order: None });
        self.colors.push(None);
        self.ids.insert(hash, id);
        Ok(id)
    }

    /// Inserts a block and re-linearizes the DAG
    pub fn add_block(&mut self, hash: Hash, parents: &[Hash], work: BlueWorkType, status: BlockStatus) -> Result<BlockId, DagError> {
        let id = self.insert_block(hash, parents, work, status)?;
        self.update_virtual()?;
        Ok(id)
    }

    /// Recomputes the virtual block and from it the total order and coloring.
    ///
    /// The selected chain of the virtual is walked from genesis. Each chain
    /// block is preceded by its mergeset in ascending (blue work, hash) order
    /// and the virtual's own mergeset closes the order.
    pub fn update_virtual(&mut self) -> Result<(), DagError> {
        let tips = self.relations.get_tips();
        if tips.is_empty() {
            self.order.clear();
            self.virtual_data = None;
            return Ok(());
        }

        let virtual_data = self.protocol.ghostdag(&self.relations, &self.ghostdag_store, &tips, BlueWorkType::zero())?;

        let mut chain = Vec::new();
        let mut current = virtual_data.selected_parent;
        loop {
            chain.push(current);
            let data = self.ghostdag_store.get(&current)?;
            if data.is_genesis() {
                break;
            }
            current = data.selected_parent;
        }
        chain.reverse();

        let mut placed: Vec<(Hash, bool)> = Vec::with_capacity(self.records.len());
        for chain_block in &chain {
            let data = self.ghostdag_store.get(chain_block)?;
            placed.extend(data.mergeset.iter().map(|h| (*h, data.is_mergeset_blue(h))));
            placed.push((*chain_block, true));
        }
        placed.extend(virtual_data.mergeset.iter().map(|h| (*h, virtual_data.is_mergeset_blue(h))));

        for record in self.records.iter_mut() {
            record.order = None;
        }
        self.colors.iter_mut().for_each(|c| *c = None);
        self.order.clear();
        for (position, (hash, blue)) in placed.into_iter().enumerate() {
            let id = self.ids[&hash];
            self.records[id as usize].order = Some(position as BlockOrder);
            self.colors[id as usize] = Some(blue);
            self.order.push(id);
        }

        debug!("virtual selected parent {} orders {} of {} blocks", virtual_data.selected_parent, self.order.len(), self.records.len());
        self.virtual_data = Some(Arc::new(virtual_data));
        Ok(())
    }

    /// Number of blocks placed in the total order
    pub fn block_count(&self) -> u64 {
        self.order.len() as u64
    }

    /// Number of inserted blocks, ordered or not
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn block_by_order(&self, order: BlockOrder) -> Option<&BlockRecord> {
        let id = *self.order.get(usize::try_from(order).ok()?)?;
        self.records.get(id as usize)
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<&BlockRecord> {
        self.records.get(usize::try_from(id).ok()?)
    }

    pub fn block_by_hash(&self, hash: &Hash) -> Option<&BlockRecord> {
        self.ids.get(hash).and_then(|id| self.block_by_id(*id))
    }

    pub fn parents(&self, id: BlockId) -> Option<&[BlockId]> {
        self.block_by_id(id).map(|r| r.parents.as_slice())
    }

    /// Size of the block's future
    pub fn confirmations(&self, id: BlockId) -> Option<u64> {
        let record = self.block_by_id(id)?;
        Reachability::new(&self.relations).future_size(&record.hash)
    }

    /// Blue/red relative to the virtual block, `None` for unordered blocks
    pub fn is_blue(&self, id: BlockId) -> Option<bool> {
        self.colors.get(usize::try_from(id).ok()?).copied().flatten()
    }

    /// The virtual block's selected parent
    pub fn main_chain_tip(&self) -> Option<&BlockRecord> {
        let virtual_data = self.virtual_data.as_ref()?;
        self.block_by_hash(&virtual_data.selected_parent)
    }

    /// The past of a block about to be inserted with `parents`, seen from
    /// that block. Parents must already be known.
    pub fn past_view(&self, parents: &[Hash]) -> Result<PastView<'_>, DagError> {
        let parents = dedup_parents(parents);
        let data = self.protocol.ghostdag(&self.relations, &self.ghostdag_store, &parents, BlueWorkType::zero())?;
        Ok(PastView { dag: self, parents, data })
    }
}

fn dedup_parents(parents: &[Hash]) -> Vec<Hash> {
    let mut unique: Vec<Hash> = Vec::with_capacity(parents.len());
    for parent in parents {
        if !unique.contains(parent) {
            unique.push(*parent);
        }
    }
    unique
}

/// GHOSTDAG view of a block that is not inserted yet
pub struct PastView<'a> {
    dag: &'a BlockDag,
    parents: Vec<Hash>,
    data: GhostdagData,
}

impl PastView<'_> {
    /// Whether `hash` is one of the parents or an ancestor of one
    pub fn contains(&self, hash: &Hash) -> bool {
        let reach = Reachability::new(&self.dag.relations);
        self.parents.iter().any(|parent| parent == hash || reach.is_dag_ancestor_of(hash, parent))
    }

    /// Color of a past block as the viewing block classifies it, found in the
    /// mergeset of the first block on its selected chain that merged it.
    /// `None` outside the past.
    pub fn is_blue(&self, hash: &Hash) -> Result<Option<bool>, DagError> {
        if let Some(blue) = mergeset_color(&self.data, hash) {
            return Ok(Some(blue));
        }
        let mut current = self.data.selected_parent;
        while current != ZERO_HASH {
            let data = self.dag.ghostdag_store.get(&current)?;
            if let Some(blue) = mergeset_color(&data, hash) {
                return Ok(Some(blue));
            }
            current = data.selected_parent;
        }
        Ok(None)
    }
}

fn mergeset_color(data: &GhostdagData, hash: &Hash) -> Option<bool> {
    if data.is_mergeset_blue(hash) {
        Some(true)
    } else if data.mergeset_reds.contains(hash) {
        Some(false)
    } else {
        None
    }
}
