//! Folder tree bookkeeping
//!
//! Folders form a forest through their `parent_id` links. Every re-parenting
//! goes through [`ResourceTree::set_parent`], which walks the parent chain of
//! the destination before writing and refuses any move that would make a
//! folder its own ancestor.
//!
//! The walk and the write happen under one lock, so two concurrent moves can
//! never each pass their check and then jointly close a loop.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::principal::Principal;
use crate::resource::{Resource, ResourceRef, ResourceStore, StoreError};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("folder cannot be its own parent: {0}")]
    SelfParent(Uuid),
    #[error("cannot move folder '{folder}' into '{parent}': destination is inside source")]
    Cycle { folder: Uuid, parent: Uuid },
    #[error("folder not found: {0}")]
    NotFound(Uuid),
    #[error("you can only move your own folders")]
    Forbidden,
    #[error("store call exceeded its deadline")]
    Timeout,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct ResourceTree<R> {
    store: R,
    // held across every check-then-write so moves are serialized
    moves: Mutex<()>,
    store_timeout: Duration,
}

impl<R: ResourceStore> ResourceTree<R> {
    pub fn new(store: R) -> Self {
        Self {
            store,
            moves: Mutex::new(()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Move a folder under `parent_id`, or to the root when `None`.
    ///
    /// Fails with [`TreeError::SelfParent`] or [`TreeError::Cycle`] if
    ///  the move would make the folder its own ancestor, and with
    ///  [`TreeError::NotFound`] if either folder is missing. Nothing is
    ///  written on failure.
    pub async fn set_parent(&self, folder_id: Uuid, parent_id: Option<Uuid>) -> Result<(), TreeError> {
        let _guard = self.moves.lock().await;

        self.folder(folder_id).await?;

        if let Some(parent_id) = parent_id {
            if parent_id == folder_id {
                return Err(TreeError::SelfParent(folder_id));
            }
            self.folder(parent_id).await?;
            self.check_acyclic(folder_id, parent_id).await?;
        }

        tokio::time::timeout(self.store_timeout, self.store.set_parent(folder_id, parent_id))
            .await
            .map_err(|_| TreeError::Timeout)??;

        tracing::info!(folder = %folder_id, parent = ?parent_id, "folder re-parented");
        Ok(())
    }

    /// [`set_parent`](Self::set_parent) on behalf of `requester`, who must
    ///  own the folder being moved and the destination folder.
    pub async fn move_folder(
        &self,
        folder_id: Uuid,
        parent_id: Option<Uuid>,
        requester: &Principal,
    ) -> Result<(), TreeError> {
        let folder = self.folder(folder_id).await?;
        if !folder.is_owned_by(requester.id) {
            return Err(TreeError::Forbidden);
        }
        if let Some(parent_id) = parent_id {
            let parent = self.folder(parent_id).await?;
            if !parent.is_owned_by(requester.id) {
                return Err(TreeError::Forbidden);
            }
        }
        self.set_parent(folder_id, parent_id).await
    }

    /// The chain of folders above `folder_id`, nearest first, ending at
    ///  a root. A dangling parent reference ends the chain early.
    pub async fn ancestors(&self, folder_id: Uuid) -> Result<Vec<Resource>, TreeError> {
        let folder = self.folder(folder_id).await?;

        let mut visited = HashSet::from([folder_id]);
        let mut chain = Vec::new();
        let mut cursor = folder.parent_id;
        while let Some(id) = cursor {
            if !visited.insert(id) {
                return Err(TreeError::Cycle {
                    folder: folder_id,
                    parent: id,
                });
            }
            match self.get(ResourceRef::folder(id)).await? {
                Some(parent) => {
                    cursor = parent.parent_id;
                    chain.push(parent);
                }
                None => break,
            }
        }
        Ok(chain)
    }

    /// Walk up from `parent_id` toward the root. Reaching `folder_id`,
    ///  or any folder twice, means the move would close a loop.
    async fn check_acyclic(&self, folder_id: Uuid, parent_id: Uuid) -> Result<(), TreeError> {
        let mut visited = HashSet::from([folder_id]);
        let mut cursor = Some(parent_id);
        while let Some(id) = cursor {
            if !visited.insert(id) {
                tracing::debug!(folder = %folder_id, parent = %parent_id, revisited = %id, "cycle detected");
                return Err(TreeError::Cycle {
                    folder: folder_id,
                    parent: parent_id,
                });
            }
            cursor = self
                .get(ResourceRef::folder(id))
                .await?
                .and_then(|folder| folder.parent_id);
        }
        Ok(())
    }

    async fn folder(&self, id: Uuid) -> Result<Resource, TreeError> {
        self.get(ResourceRef::folder(id))
            .await?
            .ok_or(TreeError::NotFound(id))
    }

    async fn get(&self, reference: ResourceRef) -> Result<Option<Resource>, TreeError> {
        Ok(tokio::time::timeout(self.store_timeout, self.store.get(reference))
            .await
            .map_err(|_| TreeError::Timeout)??)
    }
}
