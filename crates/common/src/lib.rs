/**
 * Accounts and recipients.
 *  A principal is a registered account; a recipient
 *  is whoever a grant is addressed to, either an
 *  account id or a bare email.
 */
pub mod principal;
/**
 * Files and folders subject to access control,
 *  and the collaborator contract used to look
 *  them up and mutate them.
 */
pub mod resource;
/**
 * Permission levels and the fixed action set
 *  each level confers.
 */
pub mod permission;
/**
 * Durable sharing grants keyed by resource and
 *  recipient identity, with upsert semantics.
 */
pub mod grant;
/**
 * The ordered decision chain answering
 *  "may this principal do this to that resource".
 */
pub mod ability;
/**
 * Folder parent/child bookkeeping. Keeps the
 *  folder graph a tree under concurrent moves.
 */
pub mod tree;
/**
 * Unguessable public link issuance and resolution.
 */
pub mod public_link;
/**
 * Live events, the connection registry that routes
 *  them, and the durable email contract.
 */
pub mod notify;
/**
 * The sharing use cases: share, revoke, update,
 *  publish, and the notification fan-out that
 *  follows each of them.
 */
pub mod sharing;
/**
 * Recording and failing collaborator implementations
 *  for tests.
 */
pub mod testkit;

pub mod prelude {
    pub use crate::ability::{can, decide, Decision};
    pub use crate::grant::{Grant, GrantStore, MemoryGrantStore, UpsertOutcome};
    pub use crate::notify::{ConnectionRegistry, LiveEvent, LiveNotifier, Mailer};
    pub use crate::permission::{Action, Permission};
    pub use crate::principal::{MemoryPrincipalDirectory, Principal, PrincipalDirectory, Recipient};
    pub use crate::public_link::{PublicLink, PublicLinkIssuer};
    pub use crate::resource::{
        MemoryResourceStore, Resource, ResourceKind, ResourceRef, ResourceStore, StoreError,
    };
    pub use crate::sharing::{ShareRequest, Sharing, SharingConfig, SharingError};
    pub use crate::tree::{ResourceTree, TreeError};
}
