//! Domain layer: tree model, structural mutation, selection and delete workflow
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod mutator;
pub mod sample;
pub mod selection;
pub mod workflow;

pub use arena::{FormTree, TreeIterator, TreeNode};
pub use entities::*;
pub use error::DomainError;
pub use selection::SelectionController;
pub use workflow::{DeleteState, DeleteWorkflow};
