//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent tree invariant violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("form tree is empty")]
    EmptyForest,

    #[error("form tree has no top-level node with id \"root\"")]
    MissingRoot,

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("node id must not be empty")]
    EmptyId,

    #[error("You cannot delete the initial node.")]
    RootDeletion,

    #[error("Select at least one node to delete.")]
    NothingSelected,

    #[error("The label of a node must not be empty.")]
    EmptyLabel,
}
