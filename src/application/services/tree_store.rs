//! Tree store service
//!
//! Owns the canonical in-memory form tree together with its selection, delete
//! workflow, load/save lifecycle and the last user-facing notification.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    mutator, DeleteState, DeleteWorkflow, DomainError, FormDocument, FormMeta, FormTree, NodeId,
    Notification, SelectionController, WireNode,
};
use crate::infrastructure::traits::{GatewayError, PersistenceGateway};

/// Load lifecycle: Idle -> Loading -> Loaded | NotFound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    NotFound,
}

/// Full snapshot handed to the gateway for one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub form_id: String,
    pub forest: Vec<WireNode>,
}

/// Service holding one form tree for editing.
pub struct TreeStore {
    gateway: Arc<dyn PersistenceGateway>,
    load_state: LoadState,
    form: Option<FormMeta>,
    tree: Option<FormTree>,
    selection: SelectionController,
    delete: DeleteWorkflow,
    is_saving: bool,
    notification: Option<Notification>,
}

impl TreeStore {
    /// Create an empty store backed by `gateway`.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            load_state: LoadState::Idle,
            form: None,
            tree: None,
            selection: SelectionController::new(),
            delete: DeleteWorkflow::new(),
            is_saving: false,
            notification: None,
        }
    }

    // ============================================================
    // Load
    // ============================================================

    /// Load `form_id` through the gateway.
    ///
    /// Every failure ends in `LoadState::NotFound`.
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&mut self, form_id: &str) -> ApplicationResult<()> {
        self.begin_load();
        let result = self.gateway.load_tree(form_id).await;
        self.finish_load(form_id, result)
    }

    /// Reset editing state and enter `Loading`.
    pub fn begin_load(&mut self) {
        self.load_state = LoadState::Loading;
        self.form = None;
        self.tree = None;
        self.selection = SelectionController::new();
        self.delete = DeleteWorkflow::new();
        self.notification = None;
    }

    /// Apply the outcome of a gateway load.
    pub fn finish_load(
        &mut self,
        form_id: &str,
        result: Result<FormDocument, GatewayError>,
    ) -> ApplicationResult<()> {
        let doc = match result {
            Ok(doc) => doc,
            Err(e) => {
                debug!("load {}: {}", form_id, e);
                self.load_state = LoadState::NotFound;
                return Err(ApplicationError::FormNotFound(form_id.to_string()));
            }
        };

        let meta = doc.meta();
        match FormTree::from_forest(doc.form_tree) {
            Ok(tree) => {
                info!("loaded form {} ({} nodes)", meta.id, tree.len());
                self.form = Some(meta);
                self.tree = Some(tree);
                self.load_state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                warn!("form {} has an invalid tree: {}", form_id, e);
                self.load_state = LoadState::NotFound;
                Err(e.into())
            }
        }
    }

    /// Start editing `tree` as the content of `form`, discarding any loaded state.
    ///
    /// Used when a tree is created locally (import, sample) rather than loaded.
    pub fn adopt(&mut self, form: FormMeta, tree: FormTree) {
        self.begin_load();
        info!("adopted tree for form {} ({} nodes)", form.id, tree.len());
        self.form = Some(form);
        self.tree = Some(tree);
        self.load_state = LoadState::Loaded;
    }

    // ============================================================
    // Save
    // ============================================================

    /// Send the entire current tree through the gateway.
    ///
    /// The in-memory tree is left as it was whatever the outcome, so a failed
    /// save can simply be retried.
    #[instrument(level = "debug", skip(self))]
    pub async fn save(&mut self) -> ApplicationResult<()> {
        let request = self.begin_save().ok_or(ApplicationError::NotLoaded)?;
        let result = self
            .gateway
            .save_tree(&request.form_id, &request.forest)
            .await;
        self.finish_save(&request.form_id, result)
    }

    /// Snapshot the tree and raise the saving flag. None if nothing is loaded.
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        let form_id = self.form.as_ref()?.id.clone();
        let forest = self.tree.as_ref()?.to_forest();
        self.is_saving = true;
        Some(SaveRequest { form_id, forest })
    }

    /// Clear the saving flag and record the outcome as a notification.
    pub fn finish_save(
        &mut self,
        form_id: &str,
        result: Result<(), GatewayError>,
    ) -> ApplicationResult<()> {
        self.is_saving = false;
        match result {
            Ok(()) => {
                info!("saved form {}", form_id);
                self.notification = Some(Notification::success(Notification::SAVE_SUCCEEDED));
                Ok(())
            }
            Err(source) => {
                warn!("saving form {} failed: {}", form_id, source);
                self.notification = Some(Notification::error(Notification::SAVE_FAILED));
                Err(ApplicationError::SaveFailed {
                    form_id: form_id.to_string(),
                    source,
                })
            }
        }
    }

    // ============================================================
    // Structural edits
    // ============================================================

    /// Append a node labelled `label` under `parent_id`.
    ///
    /// Returns false if nothing changed (no tree, unknown parent, blank label).
    pub fn apply_insert(&mut self, parent_id: &str, label: &str) -> bool {
        if !self.check_label(label) {
            return false;
        }
        match self.tree.take() {
            Some(tree) => {
                let found = tree.contains(parent_id);
                self.tree = Some(mutator::insert(parent_id, label, tree));
                found
            }
            None => false,
        }
    }

    /// Relabel `node_id`. Returns false if nothing changed.
    pub fn apply_update(&mut self, node_id: &str, label: &str) -> bool {
        if !self.check_label(label) {
            return false;
        }
        match self.tree.take() {
            Some(tree) => {
                let found = tree.contains(node_id);
                self.tree = Some(mutator::update(node_id, label, tree));
                found
            }
            None => false,
        }
    }

    fn check_label(&mut self, label: &str) -> bool {
        if label.trim().is_empty() {
            self.notify_validation(DomainError::EmptyLabel);
            return false;
        }
        true
    }

    fn notify_validation(&mut self, error: DomainError) {
        debug!("validation: {}", error);
        self.notification = Some(Notification::error(error.to_string()));
    }

    // ============================================================
    // Delete workflow
    // ============================================================

    /// Ask to delete the current selection. Returns true if confirmation is pending.
    pub fn request_delete_selected(&mut self) -> bool {
        match self.delete.request(self.selection.selected()) {
            Ok(()) => self.delete.is_busy(),
            Err(e) => {
                self.notify_validation(e);
                false
            }
        }
    }

    /// Delete the pending batch and clear the selection.
    pub fn confirm_delete(&mut self) {
        match self.tree.take() {
            Some(tree) => self.tree = Some(self.delete.confirm(tree, &mut self.selection)),
            None => self.delete.cancel(),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.delete.cancel();
    }

    // ============================================================
    // Selection
    // ============================================================

    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.selection.set_selection(ids);
    }

    pub fn toggle(&mut self, id: &str, selected: bool) {
        self.selection.toggle(id, selected);
    }

    pub fn select_descendants_of_toggled(&mut self) {
        if let Some(tree) = &self.tree {
            self.selection.select_descendants_of_toggled(tree);
        }
    }

    /// The sole selected id, if exactly one node is selected.
    pub fn selected_single(&self) -> Option<&str> {
        match self.selection.selected() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    // ============================================================
    // Observable state
    // ============================================================

    pub fn tree(&self) -> Option<&FormTree> {
        self.tree.as_ref()
    }

    pub fn form(&self) -> Option<&FormMeta> {
        self.form.as_ref()
    }

    pub fn selection(&self) -> &[NodeId] {
        self.selection.selected()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn delete_state(&self) -> &DeleteState {
        self.delete.state()
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// True from a delete request until it is confirmed or cancelled.
    ///
    /// Mostly this is the confirmation window (`DeleteState::ConfirmPending`): the
    /// batch is frozen but nothing has been removed yet. `confirm_delete` applies
    /// the batch synchronously, so callers never observe `Deleting` from outside.
    pub fn is_deleting(&self) -> bool {
        self.delete.is_busy()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }
}
