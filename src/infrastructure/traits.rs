//! I/O boundary traits for testability
//!
//! The persistence gateway abstracts loading and saving form trees, allowing
//! the tree store to be tested with mock implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FormDocument, WireNode};

/// Failures reported by a gateway. No structured server payload is assumed.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("form not found: {0}")]
    NotFound(String),

    #[error("network error: {context}")]
    Network {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GatewayError {
    pub fn network(context: impl Into<String>) -> Self {
        Self::Network {
            context: context.into(),
            source: None,
        }
    }

    pub fn network_from(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Loads and saves whole form trees.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch the form and its tree. Any failure is reported as `NotFound`.
    async fn load_tree(&self, form_id: &str) -> Result<FormDocument, GatewayError>;

    /// Replace the stored tree with `forest`. Always a full snapshot.
    async fn save_tree(&self, form_id: &str, forest: &[WireNode]) -> Result<(), GatewayError>;
}
