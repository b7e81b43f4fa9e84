//! # Grants
//!
//! A [`Grant`] binds one [`Recipient`] to one [`Permission`] on exactly one
//! resource. Grants do not propagate down the folder tree.
//!
//! ## Identity
//!
//! At most one grant exists per `(resource, recipient)`. Writing a second
//! grant for the same pair replaces the level of the first in place; see
//! [`GrantStore::upsert`].

mod memory;
mod store;

pub use memory::MemoryGrantStore;
pub use store::GrantStore;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::permission::Permission;
use crate::principal::{Principal, Recipient};
use crate::resource::ResourceRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub id: Uuid,
    pub resource: ResourceRef,
    pub recipient: Recipient,
    pub level: Permission,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Grant {
    pub fn new(resource: ResourceRef, recipient: Recipient, level: Permission) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            recipient,
            level,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Whether this grant is addressed to `principal` by id or by email
    pub fn matches(&self, principal: &Principal) -> bool {
        self.recipient.matches(principal)
    }

    pub fn principal_id(&self) -> Option<Uuid> {
        self.recipient.principal_id()
    }

    pub fn email(&self) -> Option<&str> {
        self.recipient.email()
    }
}

/// The result of [`GrantStore::upsert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub grant: Grant,
    /// The level the grant held before this write, if it already existed
    pub previous: Option<Permission>,
}

impl UpsertOutcome {
    pub fn is_new(&self) -> bool {
        self.previous.is_none()
    }
}
