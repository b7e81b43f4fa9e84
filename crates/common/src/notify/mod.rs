//! Notifications
//!
//! The engine decides *who* hears about an access change and *what* they are
//! told; it never delivers anything itself. Two channels exist:
//!
//! - **Live**: [`LiveEvent`]s pushed through a [`LiveNotifier`] to principals
//!   with an open connection. At most once, dropped for offline principals.
//!   [`ConnectionRegistry`] is the in-process implementation.
//! - **Durable**: structured notices handed to a [`Mailer`]. Best effort.
//!
//! Failures on either channel are logged by the caller and never undo the
//! change being announced.

mod events;
mod mailer;
mod registry;

pub use events::{GrantPayload, LiveEvent, ResourceSummary};
pub use mailer::{
    AccessRevokedNotice, InviteNotice, Mailer, MailerError, PermissionChangedNotice, ShareNotice,
};
pub use registry::{Connection, ConnectionId, ConnectionRegistry};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("connection registry has been shut down")]
    Closed,
    #[error("live notification failed: {0}")]
    Default(#[from] anyhow::Error),
}

/// Fire-and-forget delivery of live events.
pub trait LiveNotifier: Send + Sync + std::fmt::Debug + 'static {
    /// Push `event` to every open connection of `principal_id`.
    ///
    /// # Returns
    /// * `Ok(n)` - The number of connections the event was handed to;
    ///   zero when the principal is offline
    /// * `Err(NotifyError)` - The channel itself is unusable
    fn notify(&self, principal_id: Uuid, event: LiveEvent) -> Result<usize, NotifyError>;
}
