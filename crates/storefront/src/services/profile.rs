//! Profile form validation.

use rust_decimal::Decimal;
use serde::Deserialize;

use shopfront_core::{Education, EmploymentStatus, Gender};

use crate::models::{CustomerProfile, ProfileUpdate};
use crate::services::checkout::FieldErrors;

const MAX_NAME_LENGTH: usize = 100;
const MAX_OCCUPATION_LENGTH: usize = 100;
const MAX_ADDRESS_LENGTH: usize = 255;

/// Raw profile form fields.
///
/// `has_children` is a checkbox, present only when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub age: String,
    pub gender: String,
    pub employment_status: String,
    pub occupation: String,
    pub education: String,
    pub household_size: String,
    pub has_children: Option<String>,
    pub monthly_income: String,
}

impl From<&CustomerProfile> for ProfileForm {
    fn from(profile: &CustomerProfile) -> Self {
        Self {
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            postal_code: profile.postal_code.clone().unwrap_or_default(),
            age: profile.age.to_string(),
            gender: profile.gender.clone(),
            employment_status: profile.employment_status.clone(),
            occupation: profile.occupation.clone(),
            education: profile.education.clone(),
            household_size: profile.household_size.to_string(),
            has_children: profile.has_children.then(|| "on".to_string()),
            monthly_income: profile.monthly_income.to_string(),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn parse_in_range(raw: &str, min: i32, max: i32) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

impl ProfileForm {
    /// Whether the checkbox was ticked.
    #[must_use]
    pub const fn has_children_checked(&self) -> bool {
        self.has_children.is_some()
    }

    /// Validate into a profile update, or per-field messages.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.insert("first_name", "First name is required.".to_string());
        } else if first_name.chars().count() > MAX_NAME_LENGTH {
            errors.insert("first_name", "First name is too long.".to_string());
        }
        let last_name = self.last_name.trim();
        if last_name.chars().count() > MAX_NAME_LENGTH {
            errors.insert("last_name", "Last name is too long.".to_string());
        }

        let phone = optional(&self.phone);
        if phone.as_deref().is_some_and(|p| !all_digits(p, 8)) {
            errors.insert("phone", "Phone number must be 8 digits.".to_string());
        }
        let postal_code = optional(&self.postal_code);
        if postal_code.as_deref().is_some_and(|p| !all_digits(p, 6)) {
            errors.insert("postal_code", "Postal code must be 6 digits.".to_string());
        }
        let address = optional(&self.address);
        if address
            .as_deref()
            .is_some_and(|a| a.chars().count() > MAX_ADDRESS_LENGTH)
        {
            errors.insert(
                "address",
                format!("Address must be at most {MAX_ADDRESS_LENGTH} characters."),
            );
        }

        let age = parse_in_range(&self.age, 1, 120);
        if age.is_none() {
            errors.insert("age", "Enter an age between 1 and 120.".to_string());
        }
        let household_size = parse_in_range(&self.household_size, 1, 20);
        if household_size.is_none() {
            errors.insert(
                "household_size",
                "Enter a household size between 1 and 20.".to_string(),
            );
        }
        let monthly_income = self
            .monthly_income
            .trim()
            .parse::<Decimal>()
            .ok()
            .filter(|d| !d.is_sign_negative());
        if monthly_income.is_none() {
            errors.insert(
                "monthly_income",
                "Enter a monthly income of zero or more.".to_string(),
            );
        }

        let gender = Gender::from_text(&self.gender);
        if gender.is_none() {
            errors.insert("gender", "Choose a gender.".to_string());
        }
        let employment_status = EmploymentStatus::from_text(&self.employment_status);
        if employment_status.is_none() {
            errors.insert("employment_status", "Choose an employment status.".to_string());
        }
        let education = Education::from_text(&self.education);
        if education.is_none() {
            errors.insert("education", "Choose an education level.".to_string());
        }
        let occupation = self.occupation.trim();
        if occupation.chars().count() > MAX_OCCUPATION_LENGTH {
            errors.insert("occupation", "Occupation is too long.".to_string());
        }

        match (
            age,
            household_size,
            monthly_income,
            gender,
            employment_status,
            education,
        ) {
            (
                Some(age),
                Some(household_size),
                Some(monthly_income),
                Some(gender),
                Some(employment_status),
                Some(education),
            ) if errors.is_empty() => Ok(ProfileUpdate {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                phone,
                address,
                postal_code,
                age,
                gender: gender.as_str().to_string(),
                employment_status: employment_status.as_str().to_string(),
                occupation: occupation.to_string(),
                education: education.as_str().to_string(),
                household_size,
                has_children: self.has_children_checked(),
                monthly_income: monthly_income.round_dp(2),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProfileForm {
        ProfileForm {
            first_name: " Mei ".to_string(),
            last_name: "Tan".to_string(),
            phone: "91234567".to_string(),
            address: "1 Orchard Road".to_string(),
            postal_code: "238801".to_string(),
            age: "34".to_string(),
            gender: "female".to_string(),
            employment_status: "Part-time".to_string(),
            occupation: "Tech".to_string(),
            education: "Master".to_string(),
            household_size: "3".to_string(),
            has_children: Some("on".to_string()),
            monthly_income: "5400.50".to_string(),
        }
    }

    #[test]
    fn test_valid_form_normalises_choices() {
        let update = form().validate().unwrap();
        assert_eq!(update.first_name, "Mei");
        assert_eq!(update.gender, "Female");
        assert!(update.has_children);
        assert_eq!(update.monthly_income, Decimal::new(540_050, 2));
    }

    #[test]
    fn test_blank_contact_fields_are_none() {
        let update = ProfileForm {
            phone: "  ".to_string(),
            address: String::new(),
            postal_code: String::new(),
            has_children: None,
            ..form()
        }
        .validate()
        .unwrap();
        assert_eq!(update.phone, None);
        assert_eq!(update.address, None);
        assert!(!update.has_children);
    }

    #[test]
    fn test_invalid_fields_are_reported_together() {
        let errors = ProfileForm {
            first_name: String::new(),
            phone: "1234".to_string(),
            age: "abc".to_string(),
            gender: "Other".to_string(),
            monthly_income: "-1".to_string(),
            ..form()
        }
        .validate()
        .unwrap_err();
        for field in ["first_name", "phone", "age", "gender", "monthly_income"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_round_trips_profile() {
        let profile = CustomerProfile {
            id: shopfront_core::CustomerId::new(1),
            first_name: Some("Mei".to_string()),
            last_name: None,
            phone: None,
            email: None,
            address: None,
            postal_code: None,
            age: 40,
            gender: "Male".to_string(),
            employment_status: "Retired".to_string(),
            occupation: String::new(),
            education: "Diploma".to_string(),
            household_size: 2,
            has_children: false,
            monthly_income: Decimal::new(300_000, 2),
            preferred_category: String::new(),
        };
        let update = ProfileForm::from(&profile).validate().unwrap();
        assert_eq!(update.age, 40);
        assert_eq!(update.employment_status, "Retired");
        assert!(!update.has_children);
    }
}
