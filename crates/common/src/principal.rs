//! # Principals
//!
//! A [`Principal`] is a registered account. Account creation belongs to the
//! login/registration layer; the sharing engine only ever looks principals up.
//!
//! ## Recipients
//!
//! Grants are addressed to a [`Recipient`]: an account id when the recipient
//! already has an account, otherwise the bare email the owner typed in. A
//! grant addressed by email keeps resolving once an account with that email
//! is registered, because principal matching accepts either identity.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resource::StoreError;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

impl Principal {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
        }
    }

    /// The part of the email before the `@`, used as a display name
    ///  in outgoing messages.
    pub fn display_name(&self) -> &str {
        display_name(&self.email)
    }
}

pub(crate) fn display_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Who a grant is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Recipient {
    /// A known account
    Principal(Uuid),
    /// An email with no account behind it (yet)
    Email(String),
}

impl Recipient {
    /// Whether this recipient identifies `principal`, either by
    ///  account id or by email.
    pub fn matches(&self, principal: &Principal) -> bool {
        match self {
            Recipient::Principal(id) => *id == principal.id,
            Recipient::Email(email) => *email == principal.email,
        }
    }

    pub fn principal_id(&self) -> Option<Uuid> {
        match self {
            Recipient::Principal(id) => Some(*id),
            Recipient::Email(_) => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Recipient::Principal(_) => None,
            Recipient::Email(email) => Some(email),
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Principal(id) => write!(f, "principal:{}", id),
            Recipient::Email(email) => write!(f, "email:{}", email),
        }
    }
}

/// Account lookup, provided by the registration layer.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync + std::fmt::Debug + 'static {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError>;
}

/// In-memory principal directory
#[derive(Debug, Clone, Default)]
pub struct MemoryPrincipalDirectory {
    inner: Arc<RwLock<HashMap<Uuid, Principal>>>,
}

impl MemoryPrincipalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account. Registering the same id twice replaces it.
    pub fn register(&self, principal: Principal) {
        self.inner.write().insert(principal.id, principal);
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryPrincipalDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        Ok(self.inner.read().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .inner
            .read()
            .values()
            .find(|p| p.email == email)
            .cloned())
    }
}
