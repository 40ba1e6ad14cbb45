//! Staff roles and the permissions they grant.

use serde::{Deserialize, Serialize};

/// Admin panel section a staff member may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Products, categories, bulk upload and export.
    Catalogue,
    /// Stock levels and low-stock reporting.
    Inventory,
    /// Customer directory and order history.
    Customers,
    /// Staff accounts and role assignment.
    Staff,
}

/// Staff role. Each staff account holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.staff_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Every permission, including staff management.
    Admin,
    Manager,
    Merchandiser,
    Inventory,
    Support,
}

impl StaffRole {
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::Manager,
        Self::Merchandiser,
        Self::Inventory,
        Self::Support,
    ];

    /// Whether this role grants `permission`.
    #[must_use]
    pub const fn can(self, permission: Permission) -> bool {
        match (self, permission) {
            (Self::Admin, _)
            | (Self::Manager | Self::Merchandiser, Permission::Catalogue)
            | (Self::Manager | Self::Inventory, Permission::Inventory)
            | (Self::Manager | Self::Support, Permission::Customers) => true,
            _ => false,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Merchandiser => "merchandiser",
            Self::Inventory => "inventory",
            Self::Support => "support",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Merchandiser => "Merchandiser",
            Self::Inventory => "Inventory",
            Self::Support => "Support",
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid staff role: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        for permission in [
            Permission::Catalogue,
            Permission::Inventory,
            Permission::Customers,
            Permission::Staff,
        ] {
            assert!(StaffRole::Admin.can(permission));
        }
    }

    #[test]
    fn test_role_matrix() {
        assert!(StaffRole::Manager.can(Permission::Catalogue));
        assert!(StaffRole::Manager.can(Permission::Inventory));
        assert!(StaffRole::Manager.can(Permission::Customers));
        assert!(!StaffRole::Manager.can(Permission::Staff));

        assert!(StaffRole::Merchandiser.can(Permission::Catalogue));
        assert!(!StaffRole::Merchandiser.can(Permission::Inventory));
        assert!(!StaffRole::Merchandiser.can(Permission::Customers));

        assert!(StaffRole::Inventory.can(Permission::Inventory));
        assert!(!StaffRole::Inventory.can(Permission::Catalogue));

        assert!(StaffRole::Support.can(Permission::Customers));
        assert!(!StaffRole::Support.can(Permission::Inventory));
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("Merchandiser".parse::<StaffRole>().unwrap(), StaffRole::Merchandiser);
        assert_eq!(" support ".parse::<StaffRole>().unwrap(), StaffRole::Support);
        assert!("owner".parse::<StaffRole>().is_err());
    }
}
