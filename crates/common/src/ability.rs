//! Ability resolution
//!
//! Whether a principal may perform an action on a resource is decided by a
//! fixed, ordered chain. The first rule that allows wins:
//!
//! 1. **Owner**: the owner may do anything, including actions added later.
//! 2. **Public**: anyone, signed in or not, may read a public resource.
//! 3. **Granted**: a grant on this resource addressed to the principal (by
//!    id or by email) whose level includes the action.
//!
//! Anything else is denied. Resolution is pure: it sees only the resource
//! record and the grants handed to it.

use serde::Serialize;

use crate::grant::Grant;
use crate::permission::{Action, Permission};
use crate::principal::Principal;
use crate::resource::Resource;

/// Which rule decided a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "level", rename_all = "lowercase")]
pub enum Decision {
    Owner,
    Public,
    /// Allowed by a grant of this level
    Granted(Permission),
    Denied,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Denied)
    }
}

/// Decide whether `principal` may perform `action` on `resource`.
///
/// `principal` is `None` for anonymous callers. `grants` may contain
///  grants for other resources or other principals; only those that
///  target `resource` and match `principal` are considered. Should more
///  than one match, their action sets are unioned and the strongest
///  allowing level is reported.
pub fn decide(
    principal: Option<&Principal>,
    action: Action,
    resource: &Resource,
    grants: &[Grant],
) -> Decision {
    if let Some(principal) = principal {
        if resource.is_owned_by(principal.id) {
            return Decision::Owner;
        }
    }

    if resource.is_public && action == Action::Read {
        return Decision::Public;
    }

    let Some(principal) = principal else {
        return Decision::Denied;
    };

    let target = resource.reference();
    grants
        .iter()
        .filter(|g| g.resource == target && g.matches(principal))
        .map(|g| g.level)
        .filter(|level| level.allows(action))
        .max()
        .map(Decision::Granted)
        .unwrap_or(Decision::Denied)
}

/// Shorthand for `decide(..).is_allowed()`
pub fn can(
    principal: Option<&Principal>,
    action: Action,
    resource: &Resource,
    grants: &[Grant],
) -> bool {
    decide(principal, action, resource, grants).is_allowed()
}

/// Every action `principal` may perform on `resource`
pub fn allowed_actions(
    principal: Option<&Principal>,
    resource: &Resource,
    grants: &[Grant],
) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|action| can(principal, *action, resource, grants))
        .collect()
}
