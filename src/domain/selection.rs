//! Selection state: the active selection plus the toggle history.

use tracing::{debug, instrument};

use crate::domain::arena::FormTree;
use crate::domain::entities::NodeId;

/// Tracks selected node ids and the last explicit check/uncheck per id.
///
/// The selection is an insertion-ordered set. The toggle history keeps the first-seen
/// order of ids so closure results are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    selected: Vec<NodeId>,
    toggles: Vec<(NodeId, bool)>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicit check/uncheck. Does not touch the active selection.
    pub fn toggle(&mut self, id: &str, is_selected: bool) {
        match self.toggles.iter_mut().find(|(t, _)| t == id) {
            Some((_, state)) => *state = is_selected,
            None => self.toggles.push((id.to_string(), is_selected)),
        }
    }

    /// Replace the active selection wholesale. Duplicates are dropped.
    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.selected.clear();
        for id in ids {
            push_unique(&mut self.selected, id.into());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Select every toggled-on node together with all of its descendants.
    ///
    /// Toggled ids that are no longer in the tree are skipped.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn select_descendants_of_toggled(&mut self, tree: &FormTree) {
        let mut closure = Vec::new();
        for (id, _) in self.toggles.iter().filter(|(_, on)| *on) {
            if !tree.contains(id) {
                debug!("select_descendants_of_toggled: skipping stale {}", id);
                continue;
            }
            push_unique(&mut closure, id.clone());
            for descendant in tree.descendant_ids(id) {
                push_unique(&mut closure, descendant);
            }
        }
        debug!("selection closure: {} ids", closure.len());
        self.selected = closure;
    }

    /// Drop history entries for ids that no longer exist.
    pub fn forget<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let gone: Vec<&str> = ids.into_iter().collect();
        self.toggles.retain(|(id, _)| !gone.contains(&id.as_str()));
    }

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn toggle_state(&self, id: &str) -> Option<bool> {
        self.toggles
            .iter()
            .find(|(t, _)| t == id)
            .map(|(_, state)| *state)
    }
}

fn push_unique(ids: &mut Vec<NodeId>, id: NodeId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
