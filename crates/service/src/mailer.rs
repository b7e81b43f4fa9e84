use async_trait::async_trait;
use serde::Serialize;

use common::notify::{
    AccessRevokedNotice, InviteNotice, Mailer, MailerError, PermissionChangedNotice, ShareNotice,
};

/// A [`Mailer`] that writes each notice to the log as structured JSON.
///
/// Stands in for an SMTP transport; with `enabled` off every notice is
///  dropped at debug level instead.
#[derive(Debug, Clone)]
pub struct LogMailer {
    enabled: bool,
}

impl LogMailer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn emit<N: Serialize>(&self, template: &'static str, to: &str, notice: &N) -> Result<(), MailerError> {
        if !self.enabled {
            tracing::debug!(template, to, "email disabled, dropping notice");
            return Ok(());
        }
        let payload = serde_json::to_string(notice).map_err(anyhow::Error::from)?;
        tracing::info!(template, to, %payload, "email notice");
        Ok(())
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_share(&self, notice: &ShareNotice) -> Result<(), MailerError> {
        self.emit("share", &notice.recipient_email, notice)
    }

    async fn send_invite(&self, notice: &InviteNotice) -> Result<(), MailerError> {
        self.emit("invite", &notice.recipient_email, notice)
    }

    async fn send_permission_changed(
        &self,
        notice: &PermissionChangedNotice,
    ) -> Result<(), MailerError> {
        self.emit("permission-changed", &notice.recipient_email, notice)
    }

    async fn send_access_revoked(&self, notice: &AccessRevokedNotice) -> Result<(), MailerError> {
        self.emit("access-revoked", &notice.recipient_email, notice)
    }
}
