use super::relations::BlockRelations;
use consensus_core::{BlockHashSet, Hash};
use std::collections::VecDeque;

/// Ancestor and future queries over [`BlockRelations`].
///
/// Queries walk the parent edges backwards from the descendant and stop
/// descending once heights drop to the candidate ancestor's height, since no
/// block at or below that height can have it in its past.
pub struct Reachability<'a> {
    relations: &'a BlockRelations,
}

impl<'a> Reachability<'a> {
    pub fn new(relations: &'a BlockRelations) -> Self {
        Self { relations }
    }

    /// True iff `ancestor` is in the past of `descendant`. A block is not its own ancestor.
    pub fn is_dag_ancestor_of(&self, ancestor: &Hash, descendant: &Hash) -> bool {
        let (Some(ancestor_height), Some(descendant_height)) =
            (self.relations.get_height(ancestor), self.relations.get_height(descendant))
        else {
            return false;
        };
        if ancestor_height >= descendant_height {
            return false;
        }

        let mut visited = BlockHashSet::new();
        let mut stack = vec![*descendant];
        while let Some(current) = stack.pop() {
            for parent in self.relations.get_parents(&current).unwrap_or_default() {
                if parent == ancestor {
                    return true;
                }
                if !visited.insert(*parent) {
                    continue;
                }
                if self.relations.get_height(parent).is_some_and(|h| h > ancestor_height) {
                    stack.push(*parent);
                }
            }
        }
        false
    }

    /// Number of blocks having `hash` in their past
    pub fn future_size(&self, hash: &Hash) -> Option<u64> {
        let children = self.relations.get_children(hash)?;
        let mut visited = BlockHashSet::new();
        let mut queue: VecDeque<Hash> = children.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = self.relations.get_children(&current) {
                queue.extend(next.iter().filter(|c| !visited.contains(*c)));
            }
        }
        Some(visited.len() as u64)
    }
}
