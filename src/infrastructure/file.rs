//! JSON file gateway: one `{form_id}.json` document per form

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::domain::{FormDocument, WireNode};
use crate::infrastructure::traits::{GatewayError, PersistenceGateway};

/// Gateway persisting forms as JSON documents in a directory.
#[derive(Debug, Clone)]
pub struct FileGateway {
    store_dir: PathBuf,
}

impl FileGateway {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Path of the document for `form_id`; ids that could leave `store_dir` are unknown forms.
    pub fn document_path(&self, form_id: &str) -> Result<PathBuf, GatewayError> {
        let escapes = form_id.is_empty()
            || form_id == "."
            || form_id.contains("..")
            || form_id.contains(['/', '\\']);
        if escapes {
            warn!("rejecting form id {:?}", form_id);
            return Err(GatewayError::NotFound(form_id.to_string()));
        }
        Ok(self.store_dir.join(format!("{}.json", form_id)))
    }

    /// Read the stored document. `Ok(None)` only when no file exists.
    async fn read_document(&self, path: &Path) -> Result<Option<FormDocument>, GatewayError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no document at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(io_error("read", path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| GatewayError::network_from(format!("parse {}", path.display()), e))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> GatewayError {
    GatewayError::network_from(format!("{} {}", action, path.display()), e)
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    #[instrument(level = "debug", skip(self))]
    async fn load_tree(&self, form_id: &str) -> Result<FormDocument, GatewayError> {
        let path = self.document_path(form_id)?;
        self.read_document(&path)
            .await?
            .ok_or_else(|| GatewayError::NotFound(form_id.to_string()))
    }

    /// Replace the tree of the stored document atomically (temp file + rename).
    ///
    /// A missing document is created with the form id as its name. An unreadable
    /// one is left untouched and the save fails.
    #[instrument(level = "debug", skip(self, forest), fields(top_level = forest.len()))]
    async fn save_tree(&self, form_id: &str, forest: &[WireNode]) -> Result<(), GatewayError> {
        let path = self.document_path(form_id)?;
        let mut doc = self
            .read_document(&path)
            .await?
            .unwrap_or_else(|| FormDocument {
                id: form_id.to_string(),
                name: form_id.to_string(),
                description: String::new(),
                form_tree: Vec::new(),
            });
        doc.form_tree = forest.to_vec();

        let content = serde_json::to_string_pretty(&doc)
            .map_err(|e| GatewayError::network_from("serialize form", e))?;

        tokio::fs::create_dir_all(&self.store_dir)
            .await
            .map_err(|e| io_error("create", &self.store_dir, e))?;

        let tmp = self.store_dir.join(format!(".{}.json.tmp", form_id));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| io_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error("rename", &path, e))?;

        debug!("saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn given_missing_document_when_loading_then_not_found() {
        let temp = TempDir::new().unwrap();
        let gw = FileGateway::new(temp.path());

        let result = gw.load_tree("nope").await;

        assert!(matches!(result, Err(GatewayError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn given_corrupt_document_when_loading_then_reports_read_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("bad.json"), "{not json").unwrap();
        let gw = FileGateway::new(temp.path());

        let result = gw.load_tree("bad").await;

        assert!(matches!(result, Err(GatewayError::Network { .. })));
    }

    #[tokio::test]
    async fn given_malformed_document_when_saving_then_fails_and_keeps_file() {
        let temp = TempDir::new().unwrap();
        let gw = FileGateway::new(temp.path());
        let path = gw.document_path("f1").unwrap();
        let original =
            r#"{"id":"f1","name":"Intake","description":"keep me","form_tree":{"bad":1}}"#;
        std::fs::write(&path, original).unwrap();

        let result = gw.save_tree("f1", &[WireNode::leaf("root", "R")]).await;

        assert!(matches!(result, Err(GatewayError::Network { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        assert!(!temp.path().join(".f1.json.tmp").exists());
    }

    #[tokio::test]
    async fn given_form_id_escaping_store_dir_when_accessing_then_not_found() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join("store");
        std::fs::create_dir_all(&store).unwrap();
        let outside = FormDocument {
            id: "x".into(),
            name: "outside".into(),
            description: String::new(),
            form_tree: vec![WireNode::leaf("root", "R")],
        };
        std::fs::write(
            temp.path().join("x.json"),
            serde_json::to_string(&outside).unwrap(),
        )
        .unwrap();
        let gw = FileGateway::new(&store);

        for id in ["../x", "a/b", "a\\b", "..", ""] {
            let loaded = gw.load_tree(id).await;
            assert!(
                matches!(&loaded, Err(GatewayError::NotFound(got)) if got == id),
                "load {:?}",
                id
            );
            let saved = gw.save_tree(id, &[WireNode::leaf("root", "R")]).await;
            assert!(matches!(saved, Err(GatewayError::NotFound(_))), "save {:?}", id);
        }
        assert_eq!(std::fs::read_dir(&store).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn given_existing_document_when_saving_then_keeps_metadata_and_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let gw = FileGateway::new(temp.path());
        let doc = FormDocument {
            id: "f1".into(),
            name: "Intake".into(),
            description: "first visit".into(),
            form_tree: vec![WireNode::leaf("root", "old")],
        };
        std::fs::write(gw.document_path("f1").unwrap(), serde_json::to_string(&doc).unwrap()).unwrap();

        gw.save_tree("f1", &[WireNode::leaf("root", "new")])
            .await
            .unwrap();

        let loaded = gw.load_tree("f1").await.unwrap();
        assert_eq!(loaded.name, "Intake");
        assert_eq!(loaded.description, "first visit");
        assert_eq!(loaded.form_tree, vec![WireNode::leaf("root", "new")]);
        assert!(!temp.path().join(".f1.json.tmp").exists());
    }

    #[tokio::test]
    async fn given_no_document_when_saving_then_creates_it() {
        let temp = TempDir::new().unwrap();
        let gw = FileGateway::new(temp.path().join("nested"));

        gw.save_tree("f2", &[WireNode::leaf("root", "R")])
            .await
            .unwrap();

        let loaded = gw.load_tree("f2").await.unwrap();
        assert_eq!(loaded.name, "f2");
    }
}
