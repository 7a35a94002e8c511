//! Structural transforms over a form tree.
//!
//! Each function takes the tree by value and hands back the transformed tree.
//! Unknown ids are never an error: the tree comes back unchanged.
//! None of these carry policy about which ids may be touched.

use tracing::debug;

use crate::domain::arena::FormTree;

/// Append `{fresh id, label, []}` as the last child of `parent_id`.
pub fn insert(parent_id: &str, label: &str, mut tree: FormTree) -> FormTree {
    match tree.insert_child(parent_id, label) {
        Some(id) => debug!("insert: {} under {}", id, parent_id),
        None => debug!("insert: parent {} not found", parent_id),
    }
    tree
}

/// Replace only the label of `node_id`.
pub fn update(node_id: &str, label: &str, mut tree: FormTree) -> FormTree {
    if !tree.relabel(node_id, label) {
        debug!("update: {} not found", node_id);
    }
    tree
}

/// Remove `node_id`, promoting its children into its slot in the parent.
pub fn delete(node_id: &str, mut tree: FormTree) -> FormTree {
    if !tree.remove_promoting(node_id) {
        debug!("delete: {} not found", node_id);
    }
    tree
}

/// Delete every id in order, each call seeing the previous call's result.
pub fn delete_all<'a, I>(ids: I, tree: FormTree) -> FormTree
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter().fold(tree, |tree, id| delete(id, tree))
}
