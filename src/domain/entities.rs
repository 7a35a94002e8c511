//! Domain entities: wire shapes and user-facing outcomes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, tree-wide unique node identifier.
pub type NodeId = String;

/// Well-known id of the initial node every form tree starts from.
pub const ROOT_ID: &str = "root";

/// Nested node as it travels over the wire and is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub children: Vec<WireNode>,
}

impl WireNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, children: Vec<WireNode>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            children,
        }
    }

    pub fn leaf(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, Vec::new())
    }
}

/// Form as returned by the backend when loading.
///
/// Extra backend fields (owner, filename) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered forest; in practice a single `root` node.
    #[serde(default)]
    pub form_tree: Vec<WireNode>,
}

impl FormDocument {
    pub fn meta(&self) -> FormMeta {
        FormMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Form identity kept next to the in-memory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMeta {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Last outcome reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub const SAVE_SUCCEEDED: &'static str = "Form tree successfully saved.";
    pub const SAVE_FAILED: &'static str = "Error when saving the form tree.";

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
