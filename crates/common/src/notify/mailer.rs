use async_trait::async_trait;
use serde::Serialize;

use crate::permission::Permission;
use crate::resource::ResourceKind;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
    #[error("mailer error: {0}")]
    Default(#[from] anyhow::Error),
}

/// An existing account was given access to a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareNotice {
    pub recipient_email: String,
    pub recipient_name: String,
    pub owner_name: String,
    pub resource_name: String,
    pub resource_type: ResourceKind,
    pub permission: Permission,
    pub access_url: String,
}

/// Someone without an account was given access and should sign up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteNotice {
    pub recipient_email: String,
    pub owner_name: String,
    pub resource_name: String,
    pub resource_type: ResourceKind,
    pub permission: Permission,
    pub signup_url: String,
    pub access_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionChangedNotice {
    pub recipient_email: String,
    pub recipient_name: String,
    pub owner_name: String,
    pub resource_name: String,
    pub resource_type: ResourceKind,
    pub old_permission: Permission,
    pub new_permission: Permission,
    pub access_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRevokedNotice {
    pub recipient_email: String,
    /// Only known when the grant pointed at an account
    pub recipient_name: Option<String>,
    pub owner_name: String,
    pub resource_name: String,
    pub resource_type: ResourceKind,
}

/// Durable, best-effort delivery of sharing notices. Rendering and
///  transport are up to the implementation.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    async fn send_share(&self, notice: &ShareNotice) -> Result<(), MailerError>;

    async fn send_invite(&self, notice: &InviteNotice) -> Result<(), MailerError>;

    async fn send_permission_changed(
        &self,
        notice: &PermissionChangedNotice,
    ) -> Result<(), MailerError>;

    async fn send_access_revoked(&self, notice: &AccessRevokedNotice) -> Result<(), MailerError>;
}
