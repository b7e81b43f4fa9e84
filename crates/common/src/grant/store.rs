use async_trait::async_trait;
use uuid::Uuid;

use super::{Grant, UpsertOutcome};
use crate::permission::Permission;
use crate::principal::{Principal, Recipient};
use crate::resource::{ResourceRef, StoreError};

/// Durable table of sharing grants.
///
/// Implementations only store; deciding who may write a grant is the
///  sharing service's job.
#[async_trait]
pub trait GrantStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create or update the grant for `(resource, recipient)`
    ///
    /// # Arguments
    /// * `resource` - The file or folder being shared
    /// * `recipient` - The account id, or email when no account exists
    /// * `level` - The level to record
    ///
    /// # Returns
    /// * `Ok(UpsertOutcome)` - The stored grant, plus its previous level
    ///   if a grant for the same identity already existed
    ///
    /// The lookup and the write must be atomic with respect to other
    ///  upserts on the same pair: concurrent writers leave exactly one
    ///  row holding one of the written levels.
    async fn upsert(
        &self,
        resource: ResourceRef,
        recipient: Recipient,
        level: Permission,
    ) -> Result<UpsertOutcome, StoreError>;

    async fn find(
        &self,
        resource: ResourceRef,
        recipient: &Recipient,
    ) -> Result<Option<Grant>, StoreError>;

    async fn get(&self, grant_id: Uuid) -> Result<Option<Grant>, StoreError>;

    async fn list_for_resource(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError>;

    /// All grants addressed to `principal`, by account id or by email
    async fn list_for_principal(&self, principal: &Principal) -> Result<Vec<Grant>, StoreError>;

    /// Overwrite the level of an existing grant
    ///
    /// # Returns
    /// * `Ok((grant, previous))` - The updated grant and the level it replaced
    /// * `Err(StoreError::NotFound)` - No grant with that id
    async fn set_level(
        &self,
        grant_id: Uuid,
        level: Permission,
    ) -> Result<(Grant, Permission), StoreError>;

    /// Delete a grant, returning it
    ///
    /// Should fail with `StoreError::NotFound` if no grant has that id.
    async fn remove(&self, grant_id: Uuid) -> Result<Grant, StoreError>;

    /// Delete every grant on a resource that no longer exists
    async fn purge_resource(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError>;
}
