//! Session-related types for staff authentication.

use serde::{Deserialize, Serialize};

use shopfront_core::{Permission, StaffRole, StaffUserId};

use super::staff::StaffUser;

/// Session-stored staff identity.
///
/// Minimal data stored in the session to identify the signed-in staff member.
/// The role is re-read from the database on sign-in only, so a role change
/// takes effect at the next sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStaff {
    /// Staff member's database ID.
    pub id: StaffUserId,
    /// Login name.
    pub username: String,
    /// Name shown in the header.
    pub display_name: String,
    /// Role held at sign-in.
    pub role: StaffRole,
}

impl CurrentStaff {
    /// Whether the signed-in role grants `permission`.
    #[must_use]
    pub const fn can(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }
}

impl From<&StaffUser> for CurrentStaff {
    fn from(user: &StaffUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name(),
            role: user.role,
        }
    }
}

/// Severity of a flash message, mapped to a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Warning => "flash-warning",
            Self::Error => "flash-error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Session keys for staff authentication data.
pub mod keys {
    /// Key for storing the current signed-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}
