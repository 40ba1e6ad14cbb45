//! Staff account forms.

use serde::Deserialize;

use shopfront_core::{Email, StaffRole};

use super::FieldErrors;
use crate::models::{CurrentStaff, StaffUser};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const MAX_USERNAME_LENGTH: usize = 150;
const MAX_NAME_LENGTH: usize = 150;
const REQUIRED: &str = "This field is required.";

/// Raw create form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffCreateForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub password1: String,
    pub password2: String,
}

/// A create form that passed validation. The password is still plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidStaff {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: StaffRole,
    pub password: String,
}

/// Raw edit form. `is_active` is a checkbox, present only when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffEditForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub is_active: Option<String>,
    pub password: String,
}

/// An edit form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidStaffEdit {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: StaffRole,
    pub is_active: bool,
    /// New password, when one was entered.
    pub password: Option<String>,
}

impl From<&StaffUser> for StaffEditForm {
    fn from(user: &StaffUser) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            is_active: user.is_active.then(|| "on".to_string()),
            password: String::new(),
        }
    }
}

/// Whether `username` is 1-150 letters, digits or `@.+-_`.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (1..=MAX_USERNAME_LENGTH).contains(&len)
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn short_password_message() -> String {
    format!("This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters.")
}

struct Profile {
    first_name: String,
    last_name: String,
    email: Option<Email>,
    role: Option<StaffRole>,
}

fn validate_profile(
    first_name: &str,
    last_name: &str,
    email: &str,
    role: &str,
    errors: &mut FieldErrors,
) -> Profile {
    let first_name = first_name.trim();
    if first_name.is_empty() {
        errors.insert("first_name", REQUIRED.to_string());
    } else if first_name.chars().count() > MAX_NAME_LENGTH {
        errors.insert("first_name", "First name is too long.".to_string());
    }
    let last_name = last_name.trim();
    if last_name.is_empty() {
        errors.insert("last_name", REQUIRED.to_string());
    } else if last_name.chars().count() > MAX_NAME_LENGTH {
        errors.insert("last_name", "Last name is too long.".to_string());
    }

    let email = if email.trim().is_empty() {
        errors.insert("email", REQUIRED.to_string());
        None
    } else {
        let parsed = Email::parse(email).ok();
        if parsed.is_none() {
            errors.insert("email", "Enter a valid email address.".to_string());
        }
        parsed
    };

    let role = role.parse::<StaffRole>().ok();
    if role.is_none() {
        errors.insert("role", "Select a valid role.".to_string());
    }

    Profile {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        role,
    }
}

impl StaffCreateForm {
    /// Validate every field. Username uniqueness is checked on insert.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate(&self) -> Result<ValidStaff, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.insert("username", REQUIRED.to_string());
        } else if !is_valid_username(username) {
            errors.insert(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, \
                 and @/./+/-/_ characters."
                    .to_string(),
            );
        }

        let profile = validate_profile(
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.role,
            &mut errors,
        );

        if self.password1.is_empty() {
            errors.insert("password1", REQUIRED.to_string());
        } else if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
            errors.insert("password1", short_password_message());
        }
        if self.password2.is_empty() {
            errors.insert("password2", REQUIRED.to_string());
        } else if self.password1 != self.password2 {
            errors.insert(
                "password2",
                "The two password fields didn't match.".to_string(),
            );
        }

        match (profile.email, profile.role) {
            (Some(email), Some(role)) if errors.is_empty() => Ok(ValidStaff {
                username: username.to_string(),
                first_name: profile.first_name,
                last_name: profile.last_name,
                email,
                role,
                password: self.password1.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl StaffEditForm {
    #[must_use]
    pub const fn is_active_checked(&self) -> bool {
        self.is_active.is_some()
    }

    /// Validate every field for an edit of `target` by `editor`.
    ///
    /// An Admin editing their own account may not change its role away from
    /// Admin or deactivate it.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate(
        &self,
        target: &StaffUser,
        editor: &CurrentStaff,
    ) -> Result<ValidStaffEdit, FieldErrors> {
        let mut errors = FieldErrors::new();

        let profile = validate_profile(
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.role,
            &mut errors,
        );

        let password = (!self.password.is_empty()).then(|| self.password.clone());
        if password
            .as_deref()
            .is_some_and(|p| p.chars().count() < MIN_PASSWORD_LENGTH)
        {
            errors.insert("password", short_password_message());
        }

        let is_active = self.is_active_checked();
        if editor.id == target.id && target.role == StaffRole::Admin {
            if profile.role.is_some_and(|r| r != StaffRole::Admin) {
                errors.insert(
                    "role",
                    "You cannot remove the Admin role from your own account.".to_string(),
                );
            }
            if !is_active {
                errors.insert(
                    "is_active",
                    "You cannot deactivate your own account.".to_string(),
                );
            }
        }

        match (profile.email, profile.role) {
            (Some(email), Some(role)) if errors.is_empty() => Ok(ValidStaffEdit {
                first_name: profile.first_name,
                last_name: profile.last_name,
                email,
                role,
                is_active,
                password,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shopfront_core::StaffUserId;

    use super::*;

    fn create_form() -> StaffCreateForm {
        StaffCreateForm {
            username: "mei.tan".to_string(),
            first_name: "Mei".to_string(),
            last_name: "Tan".to_string(),
            email: "Mei@Example.com".to_string(),
            role: "merchandiser".to_string(),
            password1: "shelf-stacker".to_string(),
            password2: "shelf-stacker".to_string(),
        }
    }

    fn admin_user(id: i32) -> StaffUser {
        StaffUser {
            id: StaffUserId::new(id),
            username: "boss".to_string(),
            email: "boss@example.com".to_string(),
            first_name: "Bo".to_string(),
            last_name: "Ss".to_string(),
            role: StaffRole::Admin,
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_username_rules() {
        assert!(is_valid_username("a"));
        assert!(is_valid_username("ops+team@shop.sg"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(151)));
        assert!(is_valid_username(&"x".repeat(150)));
    }

    #[test]
    fn test_valid_create_form() {
        let staff = create_form().validate().unwrap();
        assert_eq!(staff.username, "mei.tan");
        assert_eq!(staff.email.as_str(), "mei@example.com");
        assert_eq!(staff.role, StaffRole::Merchandiser);
    }

    #[test]
    fn test_create_form_password_rules() {
        let mut form = create_form();
        form.password2 = "different-one".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors["password2"], "The two password fields didn't match.");

        let mut form = create_form();
        form.password1 = "short".to_string();
        form.password2 = "short".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors["password1"].contains("at least 8"));
    }

    #[test]
    fn test_create_form_rejects_unknown_role() {
        let mut form = create_form();
        form.role = "owner".to_string();
        assert!(form.validate().unwrap_err().contains_key("role"));
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        let me = admin_user(1);
        let editor = CurrentStaff::from(&me);
        let mut form = StaffEditForm::from(&me);
        form.role = "manager".to_string();
        let errors = form.validate(&me, &editor).unwrap_err();
        assert!(errors.contains_key("role"));

        let mut form = StaffEditForm::from(&me);
        form.is_active = None;
        let errors = form.validate(&me, &editor).unwrap_err();
        assert!(errors.contains_key("is_active"));
    }

    #[test]
    fn test_admin_may_demote_others() {
        let editor = CurrentStaff::from(&admin_user(1));
        let other = admin_user(2);
        let mut form = StaffEditForm::from(&other);
        form.role = "support".to_string();
        form.is_active = None;
        let edit = form.validate(&other, &editor).unwrap();
        assert_eq!(edit.role, StaffRole::Support);
        assert!(!edit.is_active);
        assert_eq!(edit.password, None);
    }

    #[test]
    fn test_edit_new_password_length() {
        let editor = CurrentStaff::from(&admin_user(1));
        let other = admin_user(2);
        let mut form = StaffEditForm::from(&other);
        form.password = "tiny".to_string();
        assert!(form.validate(&other, &editor).unwrap_err().contains_key("password"));
        form.password = "long-enough".to_string();
        assert_eq!(
            form.validate(&other, &editor).unwrap().password.as_deref(),
            Some("long-enough")
        );
    }
}
