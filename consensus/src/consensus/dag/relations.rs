use consensus_core::{BlockHashMap, BlockHashSet, Hash};

/// Parent/child edges, longest-path heights and the current tip set.
///
/// Blocks are only ever appended, and a block's parents must be inserted
/// before it.
#[derive(Default)]
pub struct BlockRelations {
    parents: BlockHashMap<Vec<Hash>>,
    children: BlockHashMap<BlockHashSet>,
    heights: BlockHashMap<u64>,
    tips: BlockHashSet,
}

impl BlockRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `hash` with `parents` and returns its height
    pub fn add_block(&mut self, hash: Hash, parents: Vec<Hash>) -> u64 {
        let height = parents.iter().filter_map(|p| self.heights.get(p)).max().map_or(0, |h| h + 1);

        for parent in &parents {
            self.children.entry(*parent).or_default().insert(hash);
            self.tips.remove(parent);
        }
        self.children.entry(hash).or_default();
        self.parents.insert(hash, parents);
        self.heights.insert(hash, height);
        self.tips.insert(hash);
        height
    }

    pub fn get_parents(&self, hash: &Hash) -> Option<&[Hash]> {
        self.parents.get(hash).map(Vec::as_slice)
    }

    /// Children of a known block; empty for tips
    pub fn get_children(&self, hash: &Hash) -> Option<&BlockHashSet> {
        self.children.get(hash)
    }

    pub fn get_height(&self, hash: &Hash) -> Option<u64> {
        self.heights.get(hash).copied()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.heights.contains_key(hash)
    }

    /// Blocks without children, sorted by hash
    pub fn get_tips(&self) -> Vec<Hash> {
        let mut tips: Vec<Hash> = self.tips.iter().copied().collect();
        tips.sort();
        tips
    }

    pub fn is_tip(&self, hash: &Hash) -> bool {
        self.tips.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}
