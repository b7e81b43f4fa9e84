//! Permission levels and actions
//!
//! Levels form a total order of increasing power. Each level maps to a fixed
//! action set; [`Permission::Manage`] implies every action, including any
//! added later.

use serde::{Deserialize, Serialize};

/// Something a principal may attempt on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Update,
    Delete,
    Share,
    Manage,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Share,
        Action::Manage,
    ];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::Share => write!(f, "share"),
            Action::Manage => write!(f, "manage"),
        }
    }
}

/// The level a grant confers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Edit,
    Delete,
    Share,
    Manage,
}

impl Permission {
    /// The actions this level confers
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Permission::View => &[Action::Read],
            Permission::Edit => &[Action::Read, Action::Update],
            Permission::Delete => &[Action::Read, Action::Update, Action::Delete],
            Permission::Share => &[Action::Read, Action::Update, Action::Delete, Action::Share],
            Permission::Manage => &Action::ALL,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        // manage is a wildcard, not an enumeration
        *self == Permission::Manage || self.actions().contains(&action)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::View => write!(f, "view"),
            Permission::Edit => write!(f, "edit"),
            Permission::Delete => write!(f, "delete"),
            Permission::Share => write!(f, "share"),
            Permission::Manage => write!(f, "manage"),
        }
    }
}
