//! Resources under access control
//!
//! - **[`Resource`]**: a file or folder record with its owner, public flag and
//!   optional public link token
//! - **[`ResourceRef`]**: a `(kind, id)` pair naming one resource
//! - **[`ResourceStore`]**: the lookup/mutation contract the engine consumes
//! - **[`MemoryResourceStore`]**: an in-memory store for tests and embedding
//!
//! Ownership is fixed at creation. `public_link` is set the first time a
//! resource is published and is never cleared by the engine.

mod memory;
mod store;

pub use memory::MemoryResourceStore;
pub use store::ResourceStore;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Folder,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Folder => "folder",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ResourceKind::File),
            "folder" => Ok(ResourceKind::Folder),
            other => Err(StoreError::Provider(anyhow::anyhow!(
                "unknown resource kind: {}",
                other
            ))),
        }
    }
}

/// Names exactly one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: Uuid,
}

impl ResourceRef {
    pub fn file(id: Uuid) -> Self {
        Self {
            kind: ResourceKind::File,
            id,
        }
    }

    pub fn folder(id: Uuid) -> Self {
        Self {
            kind: ResourceKind::Folder,
            id,
        }
    }

    /// Build a reference from the optional file/folder id pair carried
    ///  by share requests. Exactly one of the two must be set.
    pub fn from_parts(file_id: Option<Uuid>, folder_id: Option<Uuid>) -> Option<Self> {
        match (file_id, folder_id) {
            (Some(id), None) => Some(Self::file(id)),
            (None, Some(id)) => Some(Self::folder(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A file or folder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub owner_id: Uuid,
    pub is_public: bool,
    pub public_link: Option<String>,
    /// The containing folder, if any. Files and folders may both sit
    ///  inside a folder; only folders are ever re-parented.
    pub parent_id: Option<Uuid>,
}

impl Resource {
    pub fn file(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self::new(ResourceKind::File, owner_id, name)
    }

    pub fn folder(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Folder, owner_id, name)
    }

    fn new(kind: ResourceKind, owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            owner_id,
            is_public: false,
            public_link: None,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            kind: self.kind,
            id: self.id,
        }
    }

    pub fn is_owned_by(&self, principal_id: Uuid) -> bool {
        self.owner_id == principal_id
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The addressed record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// Anything the backing store itself failed at
    #[error("store provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
