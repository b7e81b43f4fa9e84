use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{Resource, ResourceKind, ResourceRef, ResourceStore, StoreError};

/// In-memory resource store using HashMaps
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceStore {
    inner: Arc<RwLock<HashMap<ResourceRef, Resource>>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the public flag while keeping the token. Nothing in the
    ///  engine unpublishes; this exists so stale links can be exercised.
    pub fn unpublish(&self, reference: ResourceRef) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let resource = inner
            .get_mut(&reference)
            .ok_or_else(|| StoreError::not_found(reference.kind.as_str(), reference.id))?;
        resource.is_public = false;
        Ok(())
    }

    /// Overwrite a record wholesale, bypassing every check. Only useful
    ///  for building deliberately inconsistent fixtures.
    pub fn put_raw(&self, resource: Resource) {
        self.inner.write().insert(resource.reference(), resource);
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get(&self, reference: ResourceRef) -> Result<Option<Resource>, StoreError> {
        Ok(self.inner.read().get(&reference).cloned())
    }

    async fn insert(&self, resource: Resource) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let reference = resource.reference();
        if inner.contains_key(&reference) {
            return Err(StoreError::Provider(anyhow::anyhow!(
                "{} already exists",
                reference
            )));
        }
        inner.insert(reference, resource);
        Ok(())
    }

    async fn remove(&self, reference: ResourceRef) -> Result<Option<Resource>, StoreError> {
        Ok(self.inner.write().remove(&reference))
    }

    async fn set_parent(&self, folder_id: Uuid, parent_id: Option<Uuid>) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let folder = inner
            .get_mut(&ResourceRef::folder(folder_id))
            .ok_or_else(|| StoreError::not_found("folder", folder_id))?;
        folder.parent_id = parent_id;
        Ok(())
    }

    async fn set_public(&self, reference: ResourceRef, token: &str) -> Result<Resource, StoreError> {
        let mut inner = self.inner.write();
        let resource = inner
            .get_mut(&reference)
            .ok_or_else(|| StoreError::not_found(reference.kind.as_str(), reference.id))?;
        resource.is_public = true;
        resource.public_link.get_or_insert_with(|| token.to_string());
        Ok(resource.clone())
    }

    async fn find_by_public_link(
        &self,
        kind: ResourceKind,
        token: &str,
    ) -> Result<Option<Resource>, StoreError> {
        Ok(self
            .inner
            .read()
            .values()
            .find(|r| r.kind == kind && r.public_link.as_deref() == Some(token))
            .cloned())
    }

    async fn children(&self, folder_id: Uuid) -> Result<Vec<Resource>, StoreError> {
        let mut children: Vec<Resource> = self
            .inner
            .read()
            .values()
            .filter(|r| r.parent_id == Some(folder_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        Ok(children)
    }
}
