use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{Grant, GrantStore, UpsertOutcome};
use crate::permission::Permission;
use crate::principal::{Principal, Recipient};
use crate::resource::{ResourceRef, StoreError};

/// In-memory grant store using HashMaps
#[derive(Debug, Clone, Default)]
pub struct MemoryGrantStore {
    inner: Arc<RwLock<MemoryGrantStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryGrantStoreInner {
    /// grant_id -> grant
    grants: HashMap<Uuid, Grant>,
    /// Identity index: (resource, recipient) -> grant_id
    by_identity: HashMap<(ResourceRef, Recipient), Uuid>,
}

impl MemoryGrantStoreInner {
    fn sorted(mut grants: Vec<Grant>) -> Vec<Grant> {
        grants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        grants
    }

    fn detach(&mut self, grant_id: Uuid) -> Option<Grant> {
        let grant = self.grants.remove(&grant_id)?;
        self.by_identity
            .remove(&(grant.resource, grant.recipient.clone()));
        Some(grant)
    }
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn upsert(
        &self,
        resource: ResourceRef,
        recipient: Recipient,
        level: Permission,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut inner = self.inner.write();

        let key = (resource, recipient);
        if let Some(grant_id) = inner.by_identity.get(&key).copied() {
            if let Some(existing) = inner.grants.get_mut(&grant_id) {
                let previous = existing.level;
                existing.level = level;
                return Ok(UpsertOutcome {
                    grant: existing.clone(),
                    previous: Some(previous),
                });
            }
        }

        let (resource, recipient) = key;
        let grant = Grant::new(resource, recipient.clone(), level);
        inner.by_identity.insert((resource, recipient), grant.id);
        inner.grants.insert(grant.id, grant.clone());

        Ok(UpsertOutcome {
            grant,
            previous: None,
        })
    }

    async fn find(
        &self,
        resource: ResourceRef,
        recipient: &Recipient,
    ) -> Result<Option<Grant>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .by_identity
            .get(&(resource, recipient.clone()))
            .and_then(|id| inner.grants.get(id))
            .cloned())
    }

    async fn get(&self, grant_id: Uuid) -> Result<Option<Grant>, StoreError> {
        Ok(self.inner.read().grants.get(&grant_id).cloned())
    }

    async fn list_for_resource(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError> {
        let inner = self.inner.read();
        Ok(MemoryGrantStoreInner::sorted(
            inner
                .grants
                .values()
                .filter(|g| g.resource == resource)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_principal(&self, principal: &Principal) -> Result<Vec<Grant>, StoreError> {
        let inner = self.inner.read();
        Ok(MemoryGrantStoreInner::sorted(
            inner
                .grants
                .values()
                .filter(|g| g.matches(principal))
                .cloned()
                .collect(),
        ))
    }

    async fn set_level(
        &self,
        grant_id: Uuid,
        level: Permission,
    ) -> Result<(Grant, Permission), StoreError> {
        let mut inner = self.inner.write();
        let grant = inner
            .grants
            .get_mut(&grant_id)
            .ok_or_else(|| StoreError::not_found("grant", grant_id))?;
        let previous = grant.level;
        grant.level = level;
        Ok((grant.clone(), previous))
    }

    async fn remove(&self, grant_id: Uuid) -> Result<Grant, StoreError> {
        self.inner
            .write()
            .detach(grant_id)
            .ok_or_else(|| StoreError::not_found("grant", grant_id))
    }

    async fn purge_resource(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError> {
        let mut inner = self.inner.write();
        let ids: Vec<Uuid> = inner
            .grants
            .values()
            .filter(|g| g.resource == resource)
            .map(|g| g.id)
            .collect();
        let removed = ids.into_iter().filter_map(|id| inner.detach(id)).collect();
        Ok(MemoryGrantStoreInner::sorted(removed))
    }
}
