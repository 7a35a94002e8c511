//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the persistence gateway and wires up services.

pub mod di;
pub mod error;
pub mod file;
pub mod http;
pub mod traits;

pub use error::{InfraError, InfraResult};
