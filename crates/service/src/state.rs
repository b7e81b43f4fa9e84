use std::sync::Arc;

use uuid::Uuid;

use super::config::{Config, ConfigError};
use super::mailer::LogMailer;

use common::grant::MemoryGrantStore;
use common::notify::{Connection, ConnectionRegistry, NotifyError};
use common::principal::MemoryPrincipalDirectory;
use common::resource::{MemoryResourceStore, Resource, ResourceRef, ResourceStore};
use common::sharing::{Sharing, SharingError};
use common::tree::ResourceTree;

pub type ServiceSharing = Sharing<MemoryGrantStore, MemoryResourceStore>;

/// Main service state - owns the stores, the live connection registry
///  and the engine components built on top of them
#[derive(Debug, Clone)]
pub struct State {
    resources: MemoryResourceStore,
    principals: MemoryPrincipalDirectory,
    registry: ConnectionRegistry,
    tree: Arc<ResourceTree<MemoryResourceStore>>,
    sharing: Arc<ServiceSharing>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup stores
        let resources = MemoryResourceStore::new();
        let grants = MemoryGrantStore::new();
        let principals = MemoryPrincipalDirectory::new();

        // 2. Setup notification channels
        let registry = ConnectionRegistry::new();
        let mailer = LogMailer::new(config.email_enabled);
        if !mailer.is_enabled() {
            tracing::warn!("email notices are disabled");
        }

        // 3. Build the engine
        let sharing_config = config.sharing();
        tracing::info!(
            base_url = %sharing_config.base_url,
            store_timeout = ?sharing_config.store_timeout,
            mail_timeout = ?sharing_config.mail_timeout,
            "sharing engine configured"
        );
        let tree = ResourceTree::new(resources.clone()).with_store_timeout(sharing_config.store_timeout);
        let sharing = Sharing::new(
            grants,
            resources.clone(),
            Arc::new(principals.clone()),
            Arc::new(registry.clone()),
            Arc::new(mailer),
            sharing_config,
        );

        Ok(Self {
            resources,
            principals,
            registry,
            tree: Arc::new(tree),
            sharing: Arc::new(sharing),
        })
    }

    pub fn sharing(&self) -> &ServiceSharing {
        &self.sharing
    }

    pub fn tree(&self) -> &ResourceTree<MemoryResourceStore> {
        &self.tree
    }

    pub fn resources(&self) -> &MemoryResourceStore {
        &self.resources
    }

    pub fn principals(&self) -> &MemoryPrincipalDirectory {
        &self.principals
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Open a live connection for an authenticated principal
    pub fn connect(&self, principal_id: Uuid) -> Result<Connection, NotifyError> {
        self.registry.connect(principal_id)
    }

    /// Delete a file or folder and every grant on it
    pub async fn destroy_resource(&self, reference: ResourceRef) -> Result<Resource, SharingError> {
        let removed = self
            .resources
            .remove(reference)
            .await?
            .ok_or_else(|| SharingError::NotFound(reference.kind.as_str(), reference.id.to_string()))?;
        self.sharing.resource_destroyed(reference).await?;
        Ok(removed)
    }

    /// Tear down process-scoped state. Live connections are closed and
    ///  no new ones are accepted.
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}

impl AsRef<ConnectionRegistry> for State {
    fn as_ref(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
