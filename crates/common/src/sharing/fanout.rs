//! Notification fan-out that runs after a grant mutation has been applied.
//!
//! Nothing in here returns an error. Failures are logged and dropped.

use std::future::Future;

use uuid::Uuid;

use super::Sharing;
use crate::grant::{Grant, GrantStore, UpsertOutcome};
use crate::notify::{
    AccessRevokedNotice, InviteNotice, LiveEvent, MailerError, PermissionChangedNotice,
    ShareNotice,
};
use crate::permission::Permission;
use crate::principal::{Principal, Recipient};
use crate::resource::{Resource, ResourceStore};

impl<G, R> Sharing<G, R>
where
    G: GrantStore,
    R: ResourceStore + Clone,
{
    pub(super) async fn announce_share(
        &self,
        resource: &Resource,
        owner: &Principal,
        email: &str,
        account: Option<&Principal>,
        outcome: &UpsertOutcome,
    ) {
        let grant = &outcome.grant;
        match (account, outcome.previous) {
            (Some(recipient), None) => {
                self.push(recipient.id, LiveEvent::granted(resource, grant));
                self.push(owner.id, LiveEvent::shared(resource, recipient.id, grant));

                let notice = ShareNotice {
                    recipient_email: email.to_string(),
                    recipient_name: recipient.display_name().to_string(),
                    owner_name: owner.display_name().to_string(),
                    resource_name: resource.name.clone(),
                    resource_type: resource.kind,
                    permission: grant.level,
                    access_url: self.dashboard_url(),
                };
                self.deliver("share", self.mailer.send_share(&notice)).await;
            }
            (Some(recipient), Some(previous)) => {
                self.notify_level_change(resource, owner, recipient, grant, previous)
                    .await;
            }
            (None, _) => {
                // no account to push to yet
                let notice = InviteNotice {
                    recipient_email: email.to_string(),
                    owner_name: owner.display_name().to_string(),
                    resource_name: resource.name.clone(),
                    resource_type: resource.kind,
                    permission: grant.level,
                    signup_url: self.signup_url(email),
                    access_url: self.dashboard_url(),
                };
                self.deliver("invite", self.mailer.send_invite(&notice)).await;
            }
        }
    }

    pub(super) async fn announce_update(
        &self,
        resource: &Resource,
        owner: &Principal,
        grant: &Grant,
        previous: Permission,
    ) {
        match self.recipient_account(&grant.recipient).await {
            Some(recipient) => {
                self.notify_level_change(resource, owner, &recipient, grant, previous)
                    .await
            }
            None => tracing::debug!(
                grant = %grant.id,
                recipient = %grant.recipient,
                "recipient has no account, skipping level change notice"
            ),
        }
    }

    pub(super) async fn announce_revoke(&self, resource: &Resource, owner: &Principal, grant: &Grant) {
        if let Some(principal_id) = grant.principal_id() {
            self.push(principal_id, LiveEvent::revoked(grant));
        }

        let (recipient_email, recipient_name) = match self.recipient_account(&grant.recipient).await {
            Some(account) => {
                let name = account.display_name().to_string();
                (account.email, Some(name))
            }
            None => match grant.email() {
                Some(email) => (email.to_string(), None),
                None => {
                    tracing::warn!(grant = %grant.id, "revoked grant has no reachable email");
                    return;
                }
            },
        };

        let notice = AccessRevokedNotice {
            recipient_email,
            recipient_name,
            owner_name: owner.display_name().to_string(),
            resource_name: resource.name.clone(),
            resource_type: resource.kind,
        };
        self.deliver("access revoked", self.mailer.send_access_revoked(&notice))
            .await;
    }

    async fn notify_level_change(
        &self,
        resource: &Resource,
        owner: &Principal,
        recipient: &Principal,
        grant: &Grant,
        previous: Permission,
    ) {
        self.push(recipient.id, LiveEvent::updated(grant));

        let notice = PermissionChangedNotice {
            recipient_email: recipient.email.clone(),
            recipient_name: recipient.display_name().to_string(),
            owner_name: owner.display_name().to_string(),
            resource_name: resource.name.clone(),
            resource_type: resource.kind,
            old_permission: previous,
            new_permission: grant.level,
            access_url: self.dashboard_url(),
        };
        self.deliver(
            "permission changed",
            self.mailer.send_permission_changed(&notice),
        )
        .await;
    }

    /// The account behind a recipient, if any. Lookup failures count as
    ///  no account.
    async fn recipient_account(&self, recipient: &Recipient) -> Option<Principal> {
        let lookup = match recipient {
            Recipient::Principal(id) => self.bounded(self.principals.find_by_id(*id)).await,
            Recipient::Email(email) => self.bounded(self.principals.find_by_email(email)).await,
        };
        match lookup {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(%recipient, error = %e, "recipient lookup failed");
                None
            }
        }
    }

    fn push(&self, principal_id: Uuid, event: LiveEvent) {
        let name = event.name();
        if let Err(e) = self.live.notify(principal_id, event) {
            tracing::warn!(principal = %principal_id, event = name, error = %e, "live notification failed");
        }
    }

    async fn deliver<F>(&self, kind: &'static str, send: F)
    where
        F: Future<Output = Result<(), MailerError>>,
    {
        match tokio::time::timeout(self.config.mail_timeout, send).await {
            Ok(Ok(())) => tracing::debug!(kind, "notice sent"),
            Ok(Err(e)) => tracing::warn!(kind, error = %e, "failed to send notice"),
            Err(_) => tracing::warn!(kind, timeout = ?self.config.mail_timeout, "notice delivery timed out"),
        }
    }

    fn dashboard_url(&self) -> String {
        format!("{}/dashboard", self.base())
    }

    fn signup_url(&self, email: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
        format!("{}/register?email={}", self.base(), encoded)
    }

    fn base(&self) -> &str {
        self.config.base_url.as_str().trim_end_matches('/')
    }
}

