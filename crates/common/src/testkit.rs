//! In-process collaborators for tests
//!
//! ```rust,ignore
//! use common::testkit::{RecordingMailer, RecordingNotifier, SentMail};
//!
//! let mailer = RecordingMailer::default();
//! let notifier = RecordingNotifier::default();
//! // ... wire them into a `Sharing` and run an operation ...
//! assert!(matches!(mailer.sent()[..], [SentMail::Invite(_)]));
//! assert!(notifier.events().is_empty());
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::notify::{
    AccessRevokedNotice, InviteNotice, LiveEvent, LiveNotifier, Mailer, MailerError, NotifyError,
    PermissionChangedNotice, ShareNotice,
};

/// A message handed to a [`RecordingMailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    Share(ShareNotice),
    Invite(InviteNotice),
    PermissionChanged(PermissionChangedNotice),
    AccessRevoked(AccessRevokedNotice),
}

/// Keeps every notice it is asked to send
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    fn record(&self, mail: SentMail) -> Result<(), MailerError> {
        self.sent.lock().push(mail);
        Ok(())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_share(&self, notice: &ShareNotice) -> Result<(), MailerError> {
        self.record(SentMail::Share(notice.clone()))
    }

    async fn send_invite(&self, notice: &InviteNotice) -> Result<(), MailerError> {
        self.record(SentMail::Invite(notice.clone()))
    }

    async fn send_permission_changed(
        &self,
        notice: &PermissionChangedNotice,
    ) -> Result<(), MailerError> {
        self.record(SentMail::PermissionChanged(notice.clone()))
    }

    async fn send_access_revoked(&self, notice: &AccessRevokedNotice) -> Result<(), MailerError> {
        self.record(SentMail::AccessRevoked(notice.clone()))
    }
}

/// Fails every send
#[derive(Debug, Clone, Default)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_share(&self, _notice: &ShareNotice) -> Result<(), MailerError> {
        Err(MailerError::Delivery("smtp unavailable".to_string()))
    }

    async fn send_invite(&self, _notice: &InviteNotice) -> Result<(), MailerError> {
        Err(MailerError::Delivery("smtp unavailable".to_string()))
    }

    async fn send_permission_changed(
        &self,
        _notice: &PermissionChangedNotice,
    ) -> Result<(), MailerError> {
        Err(MailerError::Delivery("smtp unavailable".to_string()))
    }

    async fn send_access_revoked(&self, _notice: &AccessRevokedNotice) -> Result<(), MailerError> {
        Err(MailerError::Delivery("smtp unavailable".to_string()))
    }
}

/// Keeps every live event with its addressee
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<(Uuid, LiveEvent)>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(Uuid, LiveEvent)> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, principal_id: Uuid) -> Vec<LiveEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(id, _)| *id == principal_id)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl LiveNotifier for RecordingNotifier {
    fn notify(&self, principal_id: Uuid, event: LiveEvent) -> Result<usize, NotifyError> {
        self.events.lock().push((principal_id, event));
        Ok(1)
    }
}

/// Fails every notification
#[derive(Debug, Clone, Default)]
pub struct FailingNotifier;

impl LiveNotifier for FailingNotifier {
    fn notify(&self, _principal_id: Uuid, _event: LiveEvent) -> Result<usize, NotifyError> {
        Err(NotifyError::Closed)
    }
}
