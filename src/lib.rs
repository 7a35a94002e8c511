//! Form tree editing engine.
//!
//! A form tree is a labelled question/answer tree rooted at the node with id `root`.
//! The [`domain`] layer holds the arena-backed tree, the structural mutator, selection
//! closure and the delete workflow. [`application::services::TreeStore`] composes them
//! with an asynchronous [`infrastructure::traits::PersistenceGateway`] that always
//! saves the whole tree.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
