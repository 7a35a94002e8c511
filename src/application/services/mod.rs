//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (PersistenceGateway)
//! but are themselves concrete structs, not traits.

mod tree_store;

pub use tree_store::{LoadState, SaveRequest, TreeStore};
