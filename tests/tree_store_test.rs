//! Tests for TreeStore: load/save lifecycle, selection, delete workflow

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstest::{fixture, rstest};

use formtree::application::services::{LoadState, TreeStore};
use formtree::application::ApplicationError;
use formtree::domain::{
    DeleteState, DomainError, FormDocument, Notification, Severity, WireNode, ROOT_ID,
};
use formtree::infrastructure::traits::{GatewayError, PersistenceGateway};
use formtree::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// In-memory gateway recording every save.
#[derive(Default)]
struct MockGateway {
    docs: Mutex<HashMap<String, FormDocument>>,
    saved: Mutex<Vec<(String, Vec<WireNode>)>>,
    fail_saves: AtomicBool,
    loads: AtomicUsize,
}

impl MockGateway {
    fn with_form(doc: FormDocument) -> Arc<Self> {
        let gw = Self::default();
        gw.docs.lock().unwrap().insert(doc.id.clone(), doc);
        Arc::new(gw)
    }

    fn saved(&self) -> Vec<(String, Vec<WireNode>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceGateway for MockGateway {
    async fn load_tree(&self, form_id: &str) -> Result<FormDocument, GatewayError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.docs
            .lock()
            .unwrap()
            .get(form_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(form_id.to_string()))
    }

    async fn save_tree(&self, form_id: &str, forest: &[WireNode]) -> Result<(), GatewayError> {
        self.saved
            .lock()
            .unwrap()
            .push((form_id.to_string(), forest.to_vec()));
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(GatewayError::network("backend down"));
        }
        Ok(())
    }
}

/// root "R" -> [A "a", B "b", C "c"]
#[fixture]
fn form() -> FormDocument {
    FormDocument {
        id: "f1".into(),
        name: "Intake".into(),
        description: "first visit".into(),
        form_tree: vec![WireNode::new(
            ROOT_ID,
            "R",
            vec![
                WireNode::leaf("A", "a"),
                WireNode::leaf("B", "b"),
                WireNode::leaf("C", "c"),
            ],
        )],
    }
}

async fn loaded(doc: FormDocument) -> (TreeStore, Arc<MockGateway>) {
    let gw = MockGateway::with_form(doc);
    let mut store = TreeStore::new(gw.clone());
    store.load("f1").await.unwrap();
    (store, gw)
}

fn root_children(store: &TreeStore) -> Vec<String> {
    store
        .tree()
        .unwrap()
        .children_of(ROOT_ID)
        .into_iter()
        .map(String::from)
        .collect()
}

// ============================================================
// Load
// ============================================================

#[rstest]
#[tokio::test]
async fn given_existing_form_when_loading_then_state_is_loaded(form: FormDocument) {
    let (store, gw) = loaded(form).await;

    assert_eq!(store.load_state(), LoadState::Loaded);
    assert_eq!(store.form().unwrap().name, "Intake");
    assert_eq!(store.form().unwrap().description, "first visit");
    assert_eq!(root_children(&store), vec!["A", "B", "C"]);
    assert_eq!(gw.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_unknown_form_when_loading_then_state_is_not_found() {
    let mut store = TreeStore::new(Arc::new(MockGateway::default()));

    let result = store.load("nope").await;

    assert!(matches!(result, Err(ApplicationError::FormNotFound(id)) if id == "nope"));
    assert_eq!(store.load_state(), LoadState::NotFound);
    assert!(store.tree().is_none());
}

#[rstest]
#[tokio::test]
async fn given_form_without_root_when_loading_then_state_is_not_found(mut form: FormDocument) {
    form.form_tree = vec![WireNode::leaf("x", "x")];
    let gw = MockGateway::with_form(form);
    let mut store = TreeStore::new(gw);

    let result = store.load("f1").await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MissingRoot))
    ));
    assert_eq!(store.load_state(), LoadState::NotFound);
}

#[test]
fn given_load_started_when_not_finished_then_state_is_loading() {
    let mut store = TreeStore::new(Arc::new(MockGateway::default()));
    store.begin_load();
    assert_eq!(store.load_state(), LoadState::Loading);
}

// ============================================================
// Selection
// ============================================================

#[rstest]
#[tokio::test]
async fn given_root_toggled_when_selecting_descendants_then_selects_whole_tree(
    form: FormDocument,
) {
    let (mut store, _) = loaded(form).await;

    store.toggle(ROOT_ID, true);
    store.select_descendants_of_toggled();

    assert_eq!(store.selection(), [ROOT_ID, "A", "B", "C"]);
}

#[rstest]
#[tokio::test]
async fn given_single_selection_when_asking_then_returns_it(form: FormDocument) {
    let (mut store, _) = loaded(form).await;

    store.set_selection(["B"]);
    assert_eq!(store.selected_single(), Some("B"));

    store.set_selection(["A", "B"]);
    assert_eq!(store.selected_single(), None);
}

// ============================================================
// Edits
// ============================================================

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn given_blank_label_when_inserting_then_rejects_with_notification(
    form: FormDocument,
    #[case] label: &str,
) {
    let (mut store, _) = loaded(form).await;

    assert!(!store.apply_insert(ROOT_ID, label));

    assert_eq!(root_children(&store), vec!["A", "B", "C"]);
    let n = store.notification().unwrap();
    assert_eq!(n.message, "The label of a node must not be empty.");
    assert_eq!(n.severity, Severity::Error);
}

#[rstest]
#[tokio::test]
async fn given_unknown_node_when_updating_then_reports_no_change(form: FormDocument) {
    let (mut store, _) = loaded(form).await;
    let before = store.tree().unwrap().clone();

    assert!(!store.apply_update("missing", "x"));

    assert_eq!(store.tree().unwrap(), &before);
    assert!(store.notification().is_none());
}

#[rstest]
#[tokio::test]
async fn given_node_when_updating_then_label_changes(form: FormDocument) {
    let (mut store, _) = loaded(form).await;

    assert!(store.apply_update("B", "bee"));

    assert_eq!(store.tree().unwrap().label_of("B"), Some("bee"));
}

#[test]
fn given_nothing_loaded_when_editing_then_no_op() {
    let mut store = TreeStore::new(Arc::new(MockGateway::default()));

    assert!(!store.apply_insert(ROOT_ID, "x"));
    assert!(!store.apply_update(ROOT_ID, "x"));
    store.confirm_delete();
    assert!(store.tree().is_none());
}

// ============================================================
// Delete workflow
// ============================================================

#[rstest]
#[tokio::test]
async fn given_root_selected_when_requesting_delete_then_never_confirms(form: FormDocument) {
    let (mut store, _) = loaded(form).await;
    store.set_selection([ROOT_ID, "A"]);

    assert!(!store.request_delete_selected());

    assert_eq!(store.delete_state(), &DeleteState::Idle);
    assert!(!store.is_deleting());
    assert_eq!(
        store.notification(),
        Some(&Notification::error("You cannot delete the initial node."))
    );
}

#[rstest]
#[tokio::test]
async fn given_empty_selection_when_requesting_delete_then_stays_idle(form: FormDocument) {
    let (mut store, _) = loaded(form).await;

    assert!(!store.request_delete_selected());

    assert_eq!(store.delete_state(), &DeleteState::Idle);
    assert!(store.notification().unwrap().is_error());
}

#[rstest]
#[tokio::test]
async fn given_pending_delete_when_cancelled_then_tree_and_selection_untouched(
    form: FormDocument,
) {
    let (mut store, _) = loaded(form).await;
    store.set_selection(["A", "C"]);

    assert!(store.request_delete_selected());
    assert!(store.is_deleting());
    store.cancel_delete();

    assert!(!store.is_deleting());
    assert_eq!(root_children(&store), vec!["A", "B", "C"]);
    assert_eq!(store.selection(), ["A", "C"]);
}

#[rstest]
#[tokio::test]
async fn given_pending_delete_when_observing_then_flag_covers_confirmation_window_only(
    form: FormDocument,
) {
    let (mut store, _) = loaded(form).await;
    store.set_selection(["B"]);

    assert!(store.request_delete_selected());
    assert!(store.is_deleting());
    assert_eq!(
        store.delete_state(),
        &DeleteState::ConfirmPending {
            batch: vec!["B".to_string()]
        }
    );
    assert_eq!(root_children(&store), vec!["A", "B", "C"]);

    store.confirm_delete();
    assert!(!store.is_deleting());
    assert_eq!(store.delete_state(), &DeleteState::Idle);
    assert_eq!(root_children(&store), vec!["A", "C"]);
}

// ============================================================
// Save
// ============================================================

#[rstest]
#[tokio::test]
async fn given_edits_when_saving_then_transmits_full_tree_and_notifies_success(
    form: FormDocument,
) {
    let (mut store, gw) = loaded(form).await;

    store.set_selection(["A", "C"]);
    assert!(store.request_delete_selected());
    store.confirm_delete();
    assert_eq!(root_children(&store), vec!["B"]);
    assert!(store.selection().is_empty());

    assert!(store.apply_insert(ROOT_ID, "N"));
    let children = root_children(&store);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], "B");
    let new_id = children[1].clone();

    store.save().await.unwrap();

    let saved = gw.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "f1");
    assert_eq!(
        saved[0].1,
        vec![WireNode::new(
            ROOT_ID,
            "R",
            vec![WireNode::leaf("B", "b"), WireNode::leaf(new_id, "N")],
        )]
    );
    assert_eq!(
        store.notification(),
        Some(&Notification::success("Form tree successfully saved."))
    );
    assert!(!store.is_saving());
}

#[rstest]
#[tokio::test]
async fn given_failing_backend_when_saving_then_notifies_error_and_keeps_tree(
    form: FormDocument,
) {
    let (mut store, gw) = loaded(form).await;
    store.set_selection(["A", "C"]);
    store.request_delete_selected();
    store.confirm_delete();
    store.apply_insert(ROOT_ID, "N");
    let before = store.tree().unwrap().clone();
    gw.fail_saves.store(true, Ordering::SeqCst);

    let result = store.save().await;

    assert!(matches!(result, Err(ApplicationError::SaveFailed { .. })));
    assert_eq!(
        store.notification(),
        Some(&Notification::error("Error when saving the form tree."))
    );
    assert_eq!(store.tree().unwrap(), &before);
    assert!(!store.is_saving());

    // Retry without redoing the edits
    gw.fail_saves.store(false, Ordering::SeqCst);
    store.save().await.unwrap();
    let saved = gw.saved();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].1, saved[1].1);
}

#[rstest]
#[tokio::test]
async fn given_save_in_flight_when_observing_then_saving_flag_is_set(form: FormDocument) {
    let (mut store, _) = loaded(form).await;

    let request = store.begin_save().unwrap();
    assert!(store.is_saving());
    assert_eq!(request.form_id, "f1");
    assert_eq!(request.forest, store.tree().unwrap().to_forest());

    store.finish_save(&request.form_id, Ok(())).unwrap();
    assert!(!store.is_saving());
}

#[tokio::test]
async fn given_nothing_loaded_when_saving_then_not_loaded_error() {
    let gw = Arc::new(MockGateway::default());
    let mut store = TreeStore::new(gw.clone());

    let result = store.save().await;

    assert!(matches!(result, Err(ApplicationError::NotLoaded)));
    assert!(gw.saved().is_empty());
}
