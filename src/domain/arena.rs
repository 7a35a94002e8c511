use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};
use uuid::Uuid;

use crate::domain::entities::{NodeId, WireNode, ROOT_ID};
use crate::domain::error::DomainError;

/// Node stored in the arena.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Tree-wide unique id
    pub id: NodeId,
    /// Question or answer text
    pub label: String,
    /// Index of parent node in the arena, None for top-level nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in display order
    pub children: Vec<Index>,
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Arena-based form tree.
///
/// Nodes live in a generational arena and are addressed by id through a side index,
/// so lookups are O(1) and structural edits only rewrite the affected children lists.
/// The nested wire shape only exists at the boundary (`from_forest` / `to_forest`).
#[derive(Debug, Clone)]
pub struct FormTree {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// id -> arena index
    index: HashMap<NodeId, Index>,
    /// Top-level nodes in order; in practice only `root`
    roots: Vec<Index>,
}

impl Default for FormTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FormTree {
    fn eq(&self, other: &Self) -> bool {
        self.to_forest() == other.to_forest()
    }
}

impl Eq for FormTree {}

impl FormTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Build a tree from the nested wire shape, enforcing the tree invariants.
    #[instrument(level = "debug", skip(forest), fields(top_level = forest.len()))]
    pub fn from_forest(forest: Vec<WireNode>) -> Result<Self, DomainError> {
        if forest.is_empty() {
            return Err(DomainError::EmptyForest);
        }
        if !forest.iter().any(|n| n.id == ROOT_ID) {
            return Err(DomainError::MissingRoot);
        }

        let mut tree = Self::new();
        let mut stack: Vec<(WireNode, Option<Index>)> =
            forest.into_iter().rev().map(|n| (n, None)).collect();

        while let Some((node, parent)) = stack.pop() {
            let WireNode {
                id,
                label,
                children,
            } = node;
            if id.is_empty() {
                return Err(DomainError::EmptyId);
            }
            if tree.index.contains_key(&id) {
                return Err(DomainError::DuplicateId(id));
            }
            let idx = tree.attach(id, label, parent);
            // Reverse so the first child is popped (and attached) first
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        trace!("from_forest: {} nodes", tree.len());
        Ok(tree)
    }

    /// Nested wire shape, preserving child order.
    pub fn to_forest(&self) -> Vec<WireNode> {
        self.roots.iter().filter_map(|&idx| self.to_wire(idx)).collect()
    }

    fn to_wire(&self, idx: Index) -> Option<WireNode> {
        let node = self.arena.get(idx)?;
        Some(WireNode {
            id: node.id.clone(),
            label: node.label.clone(),
            children: node
                .children
                .iter()
                .filter_map(|&child| self.to_wire(child))
                .collect(),
        })
    }

    fn attach(&mut self, id: NodeId, label: String, parent: Option<Index>) -> Index {
        let node_idx = self.arena.insert(TreeNode {
            id: id.clone(),
            label,
            parent,
            children: Vec::new(),
        });
        self.index.insert(id, node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }
        node_idx
    }

    /// UUID v4 that is not yet used anywhere in this tree.
    fn fresh_id(&self) -> NodeId {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Append a new leaf as the last child of `parent_id`.
    ///
    /// Returns the generated id, or None if the parent does not exist.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_child(&mut self, parent_id: &str, label: &str) -> Option<NodeId> {
        let parent = *self.index.get(parent_id)?;
        let id = self.fresh_id();
        self.attach(id.clone(), label.to_string(), Some(parent));
        Some(id)
    }

    /// Replace the label of `id`. Returns false if the node does not exist.
    #[instrument(level = "trace", skip(self))]
    pub fn relabel(&mut self, id: &str, label: &str) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.label = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove `id` and splice its children into its slot, keeping their order.
    ///
    /// Returns false if the node does not exist.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_promoting(&mut self, id: &str) -> bool {
        let Some(idx) = self.index.remove(id) else {
            return false;
        };
        let Some(node) = self.arena.remove(idx) else {
            return false;
        };

        for &child in &node.children {
            if let Some(child) = self.arena.get_mut(child) {
                child.parent = node.parent;
            }
        }

        let siblings = match node.parent {
            Some(parent) => match self.arena.get_mut(parent) {
                Some(parent) => &mut parent.children,
                None => return true,
            },
            None => &mut self.roots,
        };
        if let Some(pos) = siblings.iter().position(|&s| s == idx) {
            siblings.splice(pos..=pos, node.children);
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.index.get(id).and_then(|&idx| self.arena.get(idx))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        let idx = *self.index.get(id)?;
        self.arena.get_mut(idx)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn label_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|n| n.label.as_str())
    }

    /// Ids of the direct children of `id`, in order. Empty if the node does not exist.
    pub fn children_of(&self, id: &str) -> Vec<&str> {
        self.get(id)
            .map(|n| self.ids_of(&n.children))
            .unwrap_or_default()
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        let parent = self.get(id)?.parent?;
        self.arena.get(parent).map(|n| n.id.as_str())
    }

    /// Ids of the top-level nodes, in order.
    pub fn root_ids(&self) -> Vec<&str> {
        self.ids_of(&self.roots)
    }

    fn ids_of(&self, indices: &[Index]) -> Vec<&str> {
        indices
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// All ids strictly beneath `id`, pre-order. Empty if the node does not exist.
    #[instrument(level = "trace", skip(self))]
    pub fn descendant_ids(&self, id: &str) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let Some(node) = self.get(id) else {
            return ids;
        };
        let mut stack: Vec<Index> = node.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get(current) {
                ids.push(node.id.clone());
                stack.extend(node.children.iter().rev().copied());
            }
        }
        ids
    }

    /// Pre-order walk over the whole forest.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of levels of the deepest branch, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.arena.get(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }
}

pub struct TreeIterator<'a> {
    tree: &'a FormTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a FormTree) -> Self {
        let stack = tree.roots.iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some(node);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormTree {
        FormTree::from_forest(vec![WireNode::new(
            ROOT_ID,
            "R",
            vec![
                WireNode::new("a", "a", vec![WireNode::leaf("a1", "a1")]),
                WireNode::leaf("b", "b"),
            ],
        )])
        .unwrap()
    }

    #[test]
    fn given_forest_when_round_tripping_then_shape_is_preserved() {
        let tree = sample();
        let again = FormTree::from_forest(tree.to_forest()).unwrap();
        assert_eq!(tree, again);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn given_tree_when_iterating_then_visits_pre_order() {
        let ids: Vec<_> = sample().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn given_tree_when_computing_depth_then_counts_levels() {
        assert_eq!(sample().depth(), 3);
        assert_eq!(FormTree::new().depth(), 0);
    }

    #[test]
    fn given_node_when_removed_then_children_take_its_slot_with_new_parent() {
        let mut tree = sample();
        assert!(tree.remove_promoting("a"));

        assert_eq!(tree.children_of(ROOT_ID), vec!["a1", "b"]);
        assert_eq!(tree.parent_of("a1"), Some(ROOT_ID));
        assert!(!tree.contains("a"));
    }

    #[test]
    fn given_duplicate_ids_when_building_then_rejects() {
        let forest = vec![WireNode::new(
            ROOT_ID,
            "R",
            vec![WireNode::leaf("x", "1"), WireNode::leaf("x", "2")],
        )];
        assert_eq!(
            FormTree::from_forest(forest),
            Err(DomainError::DuplicateId("x".into()))
        );
    }

    #[test]
    fn given_forest_without_root_when_building_then_rejects() {
        let forest = vec![WireNode::leaf("x", "1")];
        assert_eq!(FormTree::from_forest(forest), Err(DomainError::MissingRoot));
        assert_eq!(FormTree::from_forest(vec![]), Err(DomainError::EmptyForest));
    }
}
