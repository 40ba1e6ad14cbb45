//! Staff user domain types.

use chrono::{DateTime, Utc};

use shopfront_core::{StaffRole, StaffUserId};

/// A staff account (domain type).
#[derive(Debug, Clone)]
pub struct StaffUser {
    /// Unique staff user ID.
    pub id: StaffUserId,
    /// Login name.
    pub username: String,
    /// Contact email; may be blank.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// The single role this account holds.
    pub role: StaffRole,
    /// Inactive accounts cannot sign in.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Last successful sign-in.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl StaffUser {
    /// Full name, or the username when no name is recorded.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Last sign-in as `YYYY-MM-DD HH:MM` UTC, or `Never`.
    #[must_use]
    pub fn last_login_label(&self) -> String {
        self.last_login_at.map_or_else(
            || "Never".to_string(),
            |at| at.format("%Y-%m-%d %H:%M").to_string(),
        )
    }
}
