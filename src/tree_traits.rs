//! Terminal rendering of form trees.

use termtree::Tree;
use tracing::instrument;

use crate::domain::{FormTree, TreeNode};

pub trait TreeDisplay {
    /// One display tree per top-level node.
    fn to_display_trees(&self, with_ids: bool) -> Vec<Tree<String>>;
}

fn node_text(node: &TreeNode, with_ids: bool) -> String {
    if with_ids {
        format!("{} [{}]", node.label, node.id)
    } else {
        node.label.clone()
    }
}

impl TreeDisplay for FormTree {
    #[instrument(level = "debug", skip(self))]
    fn to_display_trees(&self, with_ids: bool) -> Vec<Tree<String>> {
        fn build_tree(tree: &FormTree, node_id: &str, with_ids: bool) -> Option<Tree<String>> {
            let node = tree.get(node_id)?;
            let leaves: Vec<_> = tree
                .children_of(node_id)
                .into_iter()
                .filter_map(|child| build_tree(tree, child, with_ids))
                .collect();
            Some(Tree::new(node_text(node, with_ids)).with_leaves(leaves))
        }

        self.root_ids()
            .into_iter()
            .filter_map(|root| build_tree(self, root, with_ids))
            .collect()
    }
}
