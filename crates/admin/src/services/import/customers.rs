//! Customer demographics import for the CLI.

use std::str::FromStr;

use rust_decimal::Decimal;

use shopfront_core::{Education, EmploymentStatus, Gender};

use super::{HeaderIndex, ImportError, decode_lossy, lenient_int};
use crate::db::customers::NewCustomer;

/// A parsed customer file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFile {
    pub customers: Vec<NewCustomer>,
    /// Whether invalid UTF-8 had to be replaced.
    pub lossy: bool,
}

fn or_default(raw: &str, default: &str) -> String {
    if raw.is_empty() {
        default.to_string()
    } else {
        raw.to_string()
    }
}

fn parse_income(raw: &str) -> Decimal {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

/// Parse a customer file. Every data row becomes a customer.
///
/// # Errors
///
/// Returns `ImportError::MissingHeader` for an empty file, or
/// `ImportError::Csv` if a row cannot be read.
pub fn parse_customer_file(bytes: &[u8]) -> Result<CustomerFile, ImportError> {
    let (text, lossy) = decode_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let index = HeaderIndex::exact(reader.headers()?);
    if index.is_empty() {
        return Err(ImportError::MissingHeader);
    }

    let mut customers = Vec::new();
    for record in reader.records() {
        let record = record?;
        customers.push(NewCustomer {
            age: lenient_int(index.get(&record, "age")),
            gender: or_default(index.get(&record, "gender"), Gender::Male.as_str()),
            employment_status: or_default(
                index.get(&record, "employment_status"),
                EmploymentStatus::FullTime.as_str(),
            ),
            occupation: index.get(&record, "occupation").to_string(),
            education: or_default(
                index.get(&record, "education"),
                Education::Secondary.as_str(),
            ),
            household_size: lenient_int(index.get(&record, "household_size")),
            has_children: lenient_int(index.get(&record, "has_children")),
            monthly_income: parse_income(
                index.first_of(&record, &["monthly_income_sgd", "monthly_income"]),
            ),
            preferred_category: index.get(&record, "preferred_category").to_string(),
        });
    }

    Ok(CustomerFile { customers, lossy })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_row() {
        let file = parse_customer_file(
            b"age,gender,employment_status,occupation,education,household_size,has_children,\
monthly_income_sgd,monthly_income,preferred_category\n\
34.0,Female,Part-time,Nurse,Diploma,4,1,5200.5,99,Beauty\n",
        )
        .unwrap();
        let c = &file.customers[0];
        assert_eq!(c.age, 34);
        assert_eq!(c.gender, "Female");
        assert_eq!(c.employment_status, "Part-time");
        assert_eq!(c.occupation, "Nurse");
        assert_eq!(c.household_size, 4);
        assert_eq!(c.has_children, 1);
        assert_eq!(c.monthly_income, Decimal::new(52005, 1));
        assert_eq!(c.preferred_category, "Beauty");
    }

    #[test]
    fn test_missing_values_take_defaults() {
        let file = parse_customer_file(b"age,gender,monthly_income\nold,,1800\n").unwrap();
        let c = &file.customers[0];
        assert_eq!(c.age, 0);
        assert_eq!(c.gender, "Male");
        assert_eq!(c.employment_status, "Full-time");
        assert_eq!(c.education, "Secondary");
        assert_eq!(c.occupation, "");
        assert_eq!(c.monthly_income, Decimal::from(1800));
    }

    #[test]
    fn test_every_row_is_kept() {
        let file = parse_customer_file(b"age\n20\n20\n\n31\n").unwrap();
        assert_eq!(file.customers.len(), 3);
    }
}
