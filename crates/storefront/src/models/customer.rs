//! Customer profile types.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use shopfront_core::CustomerId;

use crate::recommender::CustomerFeatures;

/// A shopper's customer record.
///
/// Contact fields are optional because records imported for the recommender
/// carry demographics only.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub age: i32,
    pub gender: String,
    pub employment_status: String,
    pub occupation: String,
    pub education: String,
    pub household_size: i32,
    pub has_children: bool,
    pub monthly_income: Decimal,
    pub preferred_category: String,
}

impl CustomerProfile {
    /// Demographic inputs for the preferred-category model.
    #[must_use]
    pub fn features(&self) -> CustomerFeatures {
        CustomerFeatures {
            age: self.age,
            household_size: self.household_size,
            has_children: self.has_children,
            monthly_income_sgd: self.monthly_income.to_f64().unwrap_or(0.0),
            gender: self.gender.clone(),
            employment_status: self.employment_status.clone(),
            occupation: self.occupation.clone(),
            education: self.education.clone(),
        }
    }

    /// Stored preferred category, if one has been recorded.
    #[must_use]
    pub fn preferred_category(&self) -> Option<&str> {
        Some(self.preferred_category.trim()).filter(|c| !c.is_empty())
    }
}

/// Validated profile edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub age: i32,
    pub gender: String,
    pub employment_status: String,
    pub occupation: String,
    pub education: String,
    pub household_size: i32,
    pub has_children: bool,
    pub monthly_income: Decimal,
}
