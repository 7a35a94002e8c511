//! Service container for dependency injection
//!
//! Wires up the persistence gateway and the tree store.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::TreeStore;
use crate::config::{Backend, Settings};
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::file::FileGateway;
use crate::infrastructure::http::HttpGateway;
use crate::infrastructure::traits::PersistenceGateway;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Persistence gateway selected by `settings.backend`
    pub gateway: Arc<dyn PersistenceGateway>,
}

impl ServiceContainer {
    /// Create a new service container with the configured gateway.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let gateway: Arc<dyn PersistenceGateway> = match settings.backend {
            Backend::Http => Arc::new(HttpGateway::new(
                &settings.api_url,
                settings.token.clone(),
                settings.timeout(),
            )?),
            Backend::File => Arc::new(FileGateway::new(settings.store_dir.clone())),
        };
        debug!("gateway backend: {}", settings.backend);
        Ok(Self::with_deps(settings, gateway))
    }

    /// Create a service container with a custom gateway (for testing).
    pub fn with_deps(settings: Settings, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            settings: Arc::new(settings),
            gateway,
        }
    }

    /// Fresh tree store sharing this container's gateway.
    pub fn tree_store(&self) -> TreeStore {
        TreeStore::new(Arc::clone(&self.gateway))
    }
}
