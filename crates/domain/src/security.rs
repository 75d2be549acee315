use serde::{Deserialize, Serialize};
use stockroom_core::Role;

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows listing and reading stock items.
    ItemRead,
    /// Allows creating and updating stock items.
    ItemWrite,
    /// Allows deleting stock items.
    ItemDelete,
    /// Allows reading the item history ledger.
    HistoryRead,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ItemRead => "item.read",
            Self::ItemWrite => "item.write",
            Self::ItemDelete => "item.delete",
            Self::HistoryRead => "history.read",
        }
    }

    /// Returns the permissions granted to a role.
    #[must_use]
    pub fn granted_to(role: Role) -> &'static [Self] {
        match role {
            Role::Viewer => &[Self::ItemRead, Self::HistoryRead],
            Role::Manager => &[Self::ItemRead, Self::HistoryRead, Self::ItemWrite],
            Role::Admin => &[
                Self::ItemRead,
                Self::HistoryRead,
                Self::ItemWrite,
                Self::ItemDelete,
            ],
        }
    }

    /// Returns whether the role holds this permission.
    #[must_use]
    pub fn is_granted_to(&self, role: Role) -> bool {
        Self::granted_to(role).contains(self)
    }
}
