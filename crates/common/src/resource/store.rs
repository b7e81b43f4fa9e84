use async_trait::async_trait;
use uuid::Uuid;

use super::{Resource, ResourceKind, ResourceRef, StoreError};

#[async_trait]
pub trait ResourceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a single file or folder
    ///
    /// # Returns
    /// * `Ok(Some(resource))` - The resource exists
    /// * `Ok(None)` - No resource with that kind and id
    async fn get(&self, reference: ResourceRef) -> Result<Option<Resource>, StoreError>;

    /// Persist a newly created resource
    async fn insert(&self, resource: Resource) -> Result<(), StoreError>;

    /// Remove a resource, returning the removed record if it existed.
    ///
    /// Grants referencing the resource are not touched here; callers
    ///  purge them through the grant store.
    async fn remove(&self, reference: ResourceRef) -> Result<Option<Resource>, StoreError>;

    /// Overwrite the parent of a folder
    ///
    /// # Arguments
    /// * `folder_id` - The folder being moved
    /// * `parent_id` - The new containing folder, or `None` for the root
    ///
    /// Should fail with `StoreError::NotFound` if the folder does not exist.
    ///  No acyclicity check happens at this layer.
    async fn set_parent(&self, folder_id: Uuid, parent_id: Option<Uuid>) -> Result<(), StoreError>;

    /// Mark a resource public and record its link token
    ///
    /// `token` is only stored when the resource has none yet; an existing
    ///  token is kept and returned in the updated record. The check and the
    ///  write must be atomic, so concurrent first publishes agree on one
    ///  token.
    ///
    /// Should fail with `StoreError::NotFound` if the resource does not exist.
    async fn set_public(&self, reference: ResourceRef, token: &str) -> Result<Resource, StoreError>;

    /// Find the resource of `kind` carrying `token` as its public link,
    ///  regardless of its current public flag.
    async fn find_by_public_link(
        &self,
        kind: ResourceKind,
        token: &str,
    ) -> Result<Option<Resource>, StoreError>;

    /// Everything directly inside a folder
    async fn children(&self, folder_id: Uuid) -> Result<Vec<Resource>, StoreError>;
}
