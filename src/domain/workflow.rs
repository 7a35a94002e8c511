//! Delete workflow: Idle -> ConfirmPending -> Deleting -> Idle

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::domain::arena::FormTree;
use crate::domain::entities::{NodeId, ROOT_ID};
use crate::domain::error::DomainError;
use crate::domain::mutator;
use crate::domain::selection::SelectionController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    Idle,
    /// Waiting for the user; holds the batch frozen at request time.
    ConfirmPending { batch: Vec<NodeId> },
    Deleting,
}

impl fmt::Display for DeleteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteState::Idle => write!(f, "idle"),
            DeleteState::ConfirmPending { batch } => {
                write!(f, "confirm pending ({} nodes)", batch.len())
            }
            DeleteState::Deleting => write!(f, "deleting"),
        }
    }
}

/// Guards the initial node and sequences confirmation and the batched delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteWorkflow {
    state: DeleteState,
}

impl Default for DeleteWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl DeleteWorkflow {
    pub fn new() -> Self {
        Self {
            state: DeleteState::Idle,
        }
    }

    pub fn state(&self) -> &DeleteState {
        &self.state
    }

    /// A batch has been requested and not yet confirmed or cancelled.
    pub fn is_busy(&self) -> bool {
        self.state != DeleteState::Idle
    }

    /// Ask to delete `selection`.
    ///
    /// A selection containing the initial node never reaches confirmation. Requesting
    /// again while a confirmation is pending replaces the frozen batch.
    #[instrument(level = "debug", skip(self))]
    pub fn request(&mut self, selection: &[NodeId]) -> Result<(), DomainError> {
        if self.state == DeleteState::Deleting {
            warn!("request: delete batch already executing");
            return Ok(());
        }
        if selection.iter().any(|id| id == ROOT_ID) {
            self.state = DeleteState::Idle;
            return Err(DomainError::RootDeletion);
        }
        if selection.is_empty() {
            self.state = DeleteState::Idle;
            return Err(DomainError::NothingSelected);
        }

        self.state = DeleteState::ConfirmPending {
            batch: selection.to_vec(),
        };
        debug!("request: {}", self.state);
        Ok(())
    }

    /// Apply the frozen batch in order and clear the selection.
    ///
    /// Outside of `ConfirmPending` the tree is returned untouched.
    #[instrument(level = "debug", skip(self, tree, selection))]
    pub fn confirm(&mut self, tree: FormTree, selection: &mut SelectionController) -> FormTree {
        let batch = match std::mem::replace(&mut self.state, DeleteState::Deleting) {
            DeleteState::ConfirmPending { batch } => batch,
            other => {
                warn!("confirm: nothing to confirm in state {}", other);
                self.state = other;
                return tree;
            }
        };

        let tree = mutator::delete_all(batch.iter().map(String::as_str), tree);
        selection.clear_selection();
        selection.forget(batch.iter().map(String::as_str));
        info!("deleted {} nodes", batch.len());

        self.state = DeleteState::Idle;
        tree
    }

    pub fn cancel(&mut self) {
        if let DeleteState::ConfirmPending { .. } = self.state {
            debug!("cancel: back to idle");
            self.state = DeleteState::Idle;
        }
    }
}
