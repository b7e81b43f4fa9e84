//! # Sharing
//!
//! [`Sharing`] is the use-case layer sitting on top of the stores. Every
//! operation is a short, fixed sequence:
//!
//! 1. validate the request and load what it refers to
//! 2. check the requester's authority (only owners share, revoke, update,
//!    publish, or list grants)
//! 3. apply the mutation through the grant store or public link issuer
//! 4. fan out notifications
//!
//! Step 3 completes before step 4 starts, so anything a notification
//! announces is already visible to [`Sharing::authorize`]. Step 4 is best
//! effort; see [`crate::notify`].
//!
//! Holding a `Share` grant does not let a principal share further. Only the
//! owner may.

mod error;
mod fanout;

pub use error::SharingError;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::ability::{self, Decision};
use crate::grant::{Grant, GrantStore};
use crate::notify::{LiveNotifier, Mailer};
use crate::permission::{Action, Permission};
use crate::principal::{Principal, PrincipalDirectory, Recipient};
use crate::public_link::{PublicLink, PublicLinkIssuer};
use crate::resource::{Resource, ResourceKind, ResourceRef, ResourceStore};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SharingConfig {
    /// Root of every link handed out: public links, signup and dashboard
    pub base_url: Url,
    /// Deadline for each store call made by an operation
    pub store_timeout: Duration,
    /// Deadline for each durable notice
    pub mail_timeout: Duration,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            mail_timeout: DEFAULT_MAIL_TIMEOUT,
        }
    }
}

/// A request to share one file or folder with one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub file_id: Option<Uuid>,
    pub folder_id: Option<Uuid>,
    pub email: String,
    pub permission: Permission,
}

impl ShareRequest {
    pub fn new(resource: ResourceRef, email: impl Into<String>, permission: Permission) -> Self {
        let (file_id, folder_id) = match resource.kind {
            ResourceKind::File => (Some(resource.id), None),
            ResourceKind::Folder => (None, Some(resource.id)),
        };
        Self {
            file_id,
            folder_id,
            email: email.into(),
            permission,
        }
    }

    fn resource(&self) -> Result<ResourceRef, SharingError> {
        match (self.file_id, self.folder_id) {
            (None, None) => Err(SharingError::BadRequest(
                "either fileId or folderId must be provided".to_string(),
            )),
            (Some(_), Some(_)) => Err(SharingError::BadRequest(
                "cannot share both file and folder at once".to_string(),
            )),
            _ => ResourceRef::from_parts(self.file_id, self.folder_id).ok_or_else(|| {
                SharingError::BadRequest("invalid resource reference".to_string())
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sharing<G, R> {
    grants: G,
    resources: R,
    principals: Arc<dyn PrincipalDirectory>,
    live: Arc<dyn LiveNotifier>,
    mailer: Arc<dyn Mailer>,
    links: PublicLinkIssuer<R>,
    config: SharingConfig,
}

impl<G, R> Sharing<G, R>
where
    G: GrantStore,
    R: ResourceStore + Clone,
{
    pub fn new(
        grants: G,
        resources: R,
        principals: Arc<dyn PrincipalDirectory>,
        live: Arc<dyn LiveNotifier>,
        mailer: Arc<dyn Mailer>,
        config: SharingConfig,
    ) -> Self {
        let links = PublicLinkIssuer::new(resources.clone(), config.base_url.clone());
        Self {
            grants,
            resources,
            principals,
            live,
            mailer,
            links,
            config,
        }
    }

    /// Use a different deadline for store calls
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.config.store_timeout = store_timeout;
        self
    }

    pub fn config(&self) -> &SharingConfig {
        &self.config
    }

    pub fn grants(&self) -> &G {
        &self.grants
    }

    pub fn resources(&self) -> &R {
        &self.resources
    }

    /// Grant `request.email` access to a resource the requester owns.
    ///
    /// Sharing again with the same recipient updates the existing grant.
    ///  Known accounts get a live event and a share (or permission
    ///  changed) notice; unknown emails get an invite.
    pub async fn share(&self, request: &ShareRequest, requester: &Principal) -> Result<Grant, SharingError> {
        let reference = request.resource()?;
        let email = request.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(SharingError::BadRequest(format!(
                "invalid recipient email: '{}'",
                request.email
            )));
        }

        let resource = self.load(reference).await?;
        if !resource.is_owned_by(requester.id) {
            return Err(SharingError::Forbidden(format!(
                "you can only share your own {}s",
                reference.kind
            )));
        }

        let account = self.bounded(self.principals.find_by_email(email)).await?;
        let recipient = match &account {
            Some(principal) => Recipient::Principal(principal.id),
            None => Recipient::Email(email.to_string()),
        };

        let outcome = self
            .bounded(self.grants.upsert(reference, recipient, request.permission))
            .await?;
        tracing::info!(
            resource = %reference,
            recipient = %outcome.grant.recipient,
            level = %outcome.grant.level,
            previous = ?outcome.previous,
            "resource shared"
        );

        self.announce_share(&resource, requester, email, account.as_ref(), &outcome)
            .await;

        Ok(outcome.grant)
    }

    /// Remove a grant on a resource the requester owns.
    pub async fn revoke(&self, grant_id: Uuid, requester: &Principal) -> Result<Grant, SharingError> {
        let (grant, resource) = self.load_owned_grant(grant_id, requester).await?;

        let removed = self.bounded(self.grants.remove(grant.id)).await?;
        tracing::info!(
            grant = %removed.id,
            resource = %removed.resource,
            recipient = %removed.recipient,
            "grant revoked"
        );

        self.announce_revoke(&resource, requester, &removed).await;

        Ok(removed)
    }

    /// Change the level of a grant on a resource the requester owns.
    pub async fn update_level(
        &self,
        grant_id: Uuid,
        level: Permission,
        requester: &Principal,
    ) -> Result<Grant, SharingError> {
        let (grant, resource) = self.load_owned_grant(grant_id, requester).await?;

        let (updated, previous) = self.bounded(self.grants.set_level(grant.id, level)).await?;
        tracing::info!(
            grant = %updated.id,
            resource = %updated.resource,
            %previous,
            level = %updated.level,
            "grant level updated"
        );

        self.announce_update(&resource, requester, &updated, previous)
            .await;

        Ok(updated)
    }

    /// Make a resource the requester owns publicly readable.
    ///
    /// Publishing twice returns the same link.
    pub async fn publish(&self, reference: ResourceRef, requester: &Principal) -> Result<PublicLink, SharingError> {
        let resource = self.load(reference).await?;
        if !resource.is_owned_by(requester.id) {
            return Err(SharingError::Forbidden("access denied".to_string()));
        }
        self.bounded(self.links.publish(&resource)).await
    }

    /// Look up a public resource by its link token. No principal is
    ///  involved; the token is the credential.
    pub async fn resolve_public(&self, token: &str, kind: ResourceKind) -> Result<Resource, SharingError> {
        self.bounded(self.links.resolve(token, kind)).await
    }

    /// Every grant on a resource the requester owns.
    pub async fn list_resource_grants(
        &self,
        reference: ResourceRef,
        requester: &Principal,
    ) -> Result<Vec<Grant>, SharingError> {
        let resource = self.load(reference).await?;
        if !resource.is_owned_by(requester.id) {
            return Err(SharingError::Forbidden("access denied".to_string()));
        }
        self.bounded(self.grants.list_for_resource(reference)).await
    }

    /// Every grant addressed to a principal, including grants issued to
    ///  their email before they registered.
    pub async fn list_shared_with(&self, principal_id: Uuid) -> Result<Vec<Grant>, SharingError> {
        let principal = self
            .bounded(self.principals.find_by_id(principal_id))
            .await?
            .ok_or_else(|| SharingError::NotFound("principal", principal_id.to_string()))?;
        self.bounded(self.grants.list_for_principal(&principal))
            .await
    }

    /// Decide whether `principal` (or an anonymous caller) may perform
    ///  `action` on a resource, against the current grants.
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        action: Action,
        reference: ResourceRef,
    ) -> Result<Decision, SharingError> {
        let resource = self.load(reference).await?;
        let grants = match principal {
            Some(_) => self.bounded(self.grants.list_for_resource(reference)).await?,
            None => Vec::new(),
        };
        let decision = ability::decide(principal, action, &resource, &grants);
        tracing::debug!(
            principal = ?principal.map(|p| p.id),
            %action,
            resource = %reference,
            ?decision,
            "authorization decided"
        );
        Ok(decision)
    }

    /// Drop every grant on a resource that has been deleted.
    pub async fn resource_destroyed(&self, reference: ResourceRef) -> Result<Vec<Grant>, SharingError> {
        let purged = self
            .bounded(self.grants.purge_resource(reference))
            .await?;
        tracing::info!(resource = %reference, purged = purged.len(), "grants purged");
        Ok(purged)
    }

    async fn load(&self, reference: ResourceRef) -> Result<Resource, SharingError> {
        self.bounded(self.resources.get(reference))
            .await?
            .ok_or_else(|| SharingError::NotFound(reference.kind.as_str(), reference.id.to_string()))
    }

    async fn load_owned_grant(
        &self,
        grant_id: Uuid,
        requester: &Principal,
    ) -> Result<(Grant, Resource), SharingError> {
        let grant = self
            .bounded(self.grants.get(grant_id))
            .await?
            .ok_or_else(|| SharingError::NotFound("grant", grant_id.to_string()))?;
        let resource = self.load(grant.resource).await?;
        if !resource.is_owned_by(requester.id) {
            return Err(SharingError::Forbidden("access denied".to_string()));
        }
        Ok((grant, resource))
    }

    /// Run a store call under the configured deadline
    async fn bounded<T, E, F>(&self, call: F) -> Result<T, SharingError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<SharingError>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                tracing::warn!(timeout = ?self.config.store_timeout, "store call exceeded its deadline");
                Err(SharingError::Timeout)
            }
        }
    }
}
