use super::stores::{GhostdagData, GhostdagStore};
use crate::consensus::dag::{BlockRelations, Reachability};
use crate::consensus::errors::DagError;
use consensus_core::{BlockHashMap, BlockHashSet, BlueWorkType, Hash, KType};
use std::collections::VecDeque;

enum ColoringState {
    Blue,
    Red,
    Pending,
}

/// k-cluster GHOSTDAG coloring.
///
/// The protocol is stateless; every call reads the relations and the
/// GHOSTDAG data of already-inserted blocks.
pub struct GhostdagProtocol {
    k: KType,
}

impl GhostdagProtocol {
    pub fn new(k: KType) -> Self {
        Self { k }
    }

    pub fn k(&self) -> KType {
        self.k
    }

    /// Computes the GHOSTDAG data of a block with the given parents. `own_work`
    /// is the work claimed by the block's header, zero for the virtual block.
    pub fn ghostdag(
        &self,
        relations: &BlockRelations,
        store: &GhostdagStore,
        parents: &[Hash],
        own_work: BlueWorkType,
    ) -> Result<GhostdagData, DagError> {
        if parents.is_empty() {
            return Ok(GhostdagData::genesis(own_work));
        }

        let selected_parent = self.find_selected_parent(store, parents)?;
        let selected_parent_data = store.get(&selected_parent)?;
        let mergeset = self.ordered_mergeset_without_selected_parent(relations, store, selected_parent, parents)?;

        let mut data = GhostdagData::new_with_selected_parent(selected_parent, self.k);
        for candidate in &mergeset {
            match self.check_blue_candidate(relations, store, &data, candidate)? {
                Some((anticone_size, affected)) => data.add_blue(*candidate, anticone_size, &affected),
                None => data.add_red(*candidate),
            }
        }

        let mut added_work = BlueWorkType::zero();
        for blue in data.mergeset_blues.iter().skip(1) {
            added_work = added_work.saturating_add(store.block_work(blue)?);
        }

        data.mergeset = mergeset;
        data.blue_score = selected_parent_data.blue_score + data.mergeset_blues.len() as u64;
        data.blue_work = selected_parent_data.blue_work.saturating_add(added_work).saturating_add(own_work);
        Ok(data)
    }

    pub fn find_selected_parent(&self, store: &GhostdagStore, parents: &[Hash]) -> Result<Hash, DagError> {
        let mut best: Option<(BlueWorkType, Hash)> = None;
        for parent in parents {
            let key = (store.blue_work(parent)?, *parent);
            if best.map_or(true, |b| key > b) {
                best = Some(key);
            }
        }
        best.map(|(_, hash)| hash).ok_or(DagError::MissingGhostdagData(consensus_core::ZERO_HASH))
    }

    /// past(block) \ past(selected parent) without the selected parent,
    /// sorted ascending by (blue work, hash)
    fn ordered_mergeset_without_selected_parent(
        &self,
        relations: &BlockRelations,
        store: &GhostdagStore,
        selected_parent: Hash,
        parents: &[Hash],
    ) -> Result<Vec<Hash>, DagError> {
        let reach = Reachability::new(relations);
        let in_selected_past = |hash: &Hash| *hash == selected_parent || reach.is_dag_ancestor_of(hash, &selected_parent);

        let mut mergeset = BlockHashSet::new();
        let mut boundary = BlockHashSet::new();
        let mut queue = VecDeque::new();
        for parent in parents {
            if in_selected_past(parent) {
                continue;
            }
            if mergeset.insert(*parent) {
                queue.push_back(*parent);
            }
        }

        while let Some(current) = queue.pop_front() {
            for parent in relations.get_parents(&current).unwrap_or_default() {
                if mergeset.contains(parent) || boundary.contains(parent) {
                    continue;
                }
                if in_selected_past(parent) {
                    boundary.insert(*parent);
                    continue;
                }
                mergeset.insert(*parent);
                queue.push_back(*parent);
            }
        }

        let mut sorted = Vec::with_capacity(mergeset.len());
        for hash in mergeset {
            sorted.push((store.blue_work(&hash)?, hash));
        }
        sorted.sort();
        Ok(sorted.into_iter().map(|(_, hash)| hash).collect())
    }

    /// Returns the candidate's blue anticone size and the anticone sizes of
    /// the blues it touches when it may join the blue set, `None` when red.
    fn check_blue_candidate(
        &self,
        relations: &BlockRelations,
        store: &GhostdagStore,
        new_data: &GhostdagData,
        candidate: &Hash,
    ) -> Result<Option<(KType, BlockHashMap<KType>)>, DagError> {
        if new_data.mergeset_blues.len() as KType == self.k + 1 {
            return Ok(None);
        }

        let reach = Reachability::new(relations);
        let mut anticone_size: KType = 0;
        let mut affected = BlockHashMap::new();

        // The new block itself is the first chain block; it is not an ancestor of anything yet
        match self.check_chain_block(&reach, store, new_data, None, new_data, candidate, &mut anticone_size, &mut affected)? {
            ColoringState::Blue => return Ok(Some((anticone_size, affected))),
            ColoringState::Red => return Ok(None),
            ColoringState::Pending => {}
        }

        let mut chain_block = new_data.selected_parent;
        loop {
            let chain_data = store.get(&chain_block)?;
            match self.check_chain_block(
                &reach,
                store,
                new_data,
                Some(&chain_block),
                &chain_data,
                candidate,
                &mut anticone_size,
                &mut affected,
            )? {
                ColoringState::Blue => return Ok(Some((anticone_size, affected))),
                ColoringState::Red => return Ok(None),
                ColoringState::Pending => {}
            }
            if chain_data.is_genesis() {
                // Genesis is in every candidate's past, so this is unreachable on a well-formed DAG
                return Ok(Some((anticone_size, affected)));
            }
            chain_block = chain_data.selected_parent;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_chain_block(
        &self,
        reach: &Reachability<'_>,
        store: &GhostdagStore,
        new_data: &GhostdagData,
        chain_hash: Option<&Hash>,
        chain_data: &GhostdagData,
        candidate: &Hash,
        anticone_size: &mut KType,
        affected: &mut BlockHashMap<KType>,
    ) -> Result<ColoringState, DagError> {
        if let Some(hash) = chain_hash {
            // Everything still unvisited is in the candidate's past
            if reach.is_dag_ancestor_of(hash, candidate) {
                return Ok(ColoringState::Blue);
            }
        }

        for blue in &chain_data.mergeset_blues {
            if reach.is_dag_ancestor_of(blue, candidate) {
                continue;
            }
            let blue_size = self.blue_anticone_size(store, blue, new_data)?;
            affected.insert(*blue, blue_size);
            *anticone_size += 1;
            if *anticone_size > self.k || blue_size == self.k {
                return Ok(ColoringState::Red);
            }
        }
        Ok(ColoringState::Pending)
    }

    /// Blue anticone size of `block` from the point of view of `context`,
    /// found on the first chain block of `context` that recorded it
    fn blue_anticone_size(&self, store: &GhostdagStore, block: &Hash, context: &GhostdagData) -> Result<KType, DagError> {
        if let Some(size) = context.blues_anticone_sizes.get(block) {
            return Ok(*size);
        }
        if context.is_genesis() {
            return Err(DagError::MissingAnticoneSize(*block));
        }
        let mut current = context.selected_parent;
        loop {
            let data = store.get(&current)?;
            if let Some(size) = data.blues_anticone_sizes.get(block) {
                return Ok(*size);
            }
            if data.is_genesis() {
                return Err(DagError::MissingAnticoneSize(*block));
            }
            current = data.selected_parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::hashing::header::calc_work;
    use consensus_core::constants::MIN_DIFFICULTY_BITS;

    struct TestDag {
        relations: BlockRelations,
        store: GhostdagStore,
        protocol: GhostdagProtocol,
    }

    impl TestDag {
        fn new(k: KType) -> Self {
            Self { relations: BlockRelations::new(), store: GhostdagStore::new(), protocol: GhostdagProtocol::new(k) }
        }

        fn add(&mut self, word: u64, parents: &[Hash]) -> (Hash, GhostdagData) {
            let hash = Hash::from_u64_word(word);
            let work = calc_work(MIN_DIFFICULTY_BITS);
            let data = self.protocol.ghostdag(&self.relations, &self.store, parents, work).unwrap();
            self.relations.add_block(hash, parents.to_vec());
            self.store.insert(hash, data.clone(), work);
            (hash, data)
        }
    }

    #[test]
    fn test_chain_is_all_blue() {
        let mut dag = TestDag::new(3);
        let (g, genesis) = dag.add(1, &[]);
        assert!(genesis.is_genesis());
        let (a, a_data) = dag.add(2, &[g]);
        let (_, b_data) = dag.add(3, &[a]);
        assert_eq!(a_data.selected_parent, g);
        assert_eq!(b_data.selected_parent, a);
        assert_eq!(b_data.mergeset_blues, vec![a]);
        assert!(b_data.mergeset.is_empty());
        assert_eq!(b_data.blue_score, 2);
        assert!(b_data.blue_work > a_data.blue_work);
    }

    #[test]
    fn test_merge_within_k_is_blue() {
        let mut dag = TestDag::new(3);
        let (g, _) = dag.add(1, &[]);
        let (a, _) = dag.add(2, &[g]);
        let (b, _) = dag.add(3, &[g]);
        let (_, m) = dag.add(4, &[a, b]);
        // Equal blue work, so the larger hash wins
        assert_eq!(m.selected_parent, b);
        assert_eq!(m.mergeset, vec![a]);
        assert_eq!(m.mergeset_blues, vec![b, a]);
        assert!(m.mergeset_reds.is_empty());
        assert_eq!(m.blues_anticone_sizes.get(&a), Some(&1));
        assert_eq!(m.blues_anticone_sizes.get(&b), Some(&1));
    }

    #[test]
    fn test_k_zero_colors_side_branch_red() {
        let mut dag = TestDag::new(0);
        let (g, _) = dag.add(1, &[]);
        let (a, _) = dag.add(2, &[g]);
        let (b, _) = dag.add(3, &[g]);
        let (c, _) = dag.add(5, &[b]);
        let (_, m) = dag.add(4, &[a, c]);
        assert_eq!(m.selected_parent, c);
        assert_eq!(m.mergeset, vec![a]);
        assert_eq!(m.mergeset_blues, vec![c]);
        assert_eq!(m.mergeset_reds, vec![a]);
        assert_eq!(m.blue_score, 3);
    }

    #[test]
    fn test_mergeset_excludes_selected_past() {
        let mut dag = TestDag::new(5);
        let (g, _) = dag.add(1, &[]);
        let (a, _) = dag.add(2, &[g]);
        let (b, _) = dag.add(3, &[a]);
        let (x, _) = dag.add(6, &[g]);
        let (y, _) = dag.add(7, &[x]);
        let (_, m) = dag.add(8, &[b, y]);
        // Both branches carry the same work, y has the larger hash
        assert_eq!(m.selected_parent, y);
        let mut expected = vec![a, b];
        expected.sort_by_key(|h| (dag.store.blue_work(h).unwrap(), *h));
        assert_eq!(m.mergeset, expected);
        assert_eq!(m.mergeset_size(), 3);
    }
}
