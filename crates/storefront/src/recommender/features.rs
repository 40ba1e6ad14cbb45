//! Customer feature encoding for the preferred-category model.
//!
//! Four numeric columns followed by one-hot columns named
//! `<field>_<value>`, matching how the model was trained.

use shopfront_core::demographics::OCCUPATIONS;
use shopfront_core::{Education, EmploymentStatus, Gender};

/// Numeric feature columns, in model order.
pub const NUMERIC_COLUMNS: [&str; 4] = ["age", "household_size", "has_children", "monthly_income_sgd"];

/// Demographic inputs to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerFeatures {
    pub age: i32,
    pub household_size: i32,
    pub has_children: bool,
    pub monthly_income_sgd: f64,
    pub gender: String,
    pub employment_status: String,
    pub occupation: String,
    pub education: String,
}

impl CustomerFeatures {
    /// Value of one model column for this customer. Unknown columns are 0.
    #[must_use]
    pub fn value(&self, column: &str) -> f64 {
        match column {
            "age" => f64::from(self.age),
            "household_size" => f64::from(self.household_size),
            "has_children" => f64::from(u8::from(self.has_children)),
            "monthly_income_sgd" => self.monthly_income_sgd,
            _ => self.one_hot(column),
        }
    }

    fn one_hot(&self, column: &str) -> f64 {
        let fields = [
            ("gender_", &self.gender),
            ("employment_status_", &self.employment_status),
            ("occupation_", &self.occupation),
            ("education_", &self.education),
        ];
        let hit = fields.iter().any(|(prefix, value)| {
            column
                .strip_prefix(prefix)
                .is_some_and(|wanted| wanted == value.trim())
        });
        if hit { 1.0 } else { 0.0 }
    }

    /// Encode against `columns`, in that order.
    #[must_use]
    pub fn encode(&self, columns: &[String]) -> Vec<f64> {
        columns.iter().map(|column| self.value(column)).collect()
    }
}

/// The standard column set: numeric columns, then each one-hot group with
/// its values sorted.
#[must_use]
pub fn standard_columns() -> Vec<String> {
    let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(ToString::to_string).collect();

    let groups: [(&str, Vec<&str>); 4] = [
        ("gender", Gender::ALL.iter().map(|g| g.as_str()).collect()),
        (
            "employment_status",
            EmploymentStatus::ALL.iter().map(|e| e.as_str()).collect(),
        ),
        ("occupation", OCCUPATIONS.to_vec()),
        ("education", Education::ALL.iter().map(|e| e.as_str()).collect()),
    ];

    for (field, mut values) in groups {
        values.sort_unstable();
        columns.extend(values.into_iter().map(|value| format!("{field}_{value}")));
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerFeatures {
        CustomerFeatures {
            age: 29,
            household_size: 2,
            has_children: true,
            monthly_income_sgd: 5000.0,
            gender: "Female".to_string(),
            employment_status: "Full-time".to_string(),
            occupation: "Sales".to_string(),
            education: "Bachelor".to_string(),
        }
    }

    #[test]
    fn test_standard_columns() {
        let columns = standard_columns();
        assert_eq!(columns.len(), 22);
        assert_eq!(columns[4], "gender_Female");
        assert_eq!(columns[6], "employment_status_Full-time");
        assert_eq!(columns[8], "employment_status_Retired");
        assert!(columns.contains(&"occupation_Skilled Trades".to_string()));
        assert_eq!(columns[21], "education_Secondary");
    }

    #[test]
    fn test_encode_one_hot_and_numeric() {
        let columns = vec![
            "age".to_string(),
            "has_children".to_string(),
            "gender_Female".to_string(),
            "gender_Male".to_string(),
            "occupation_Sales".to_string(),
            "favourite_colour_Blue".to_string(),
        ];
        assert_eq!(customer().encode(&columns), vec![29.0, 1.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unlisted_value_sets_no_column() {
        let mut c = customer();
        c.occupation = "Astronaut".to_string();
        let encoded = c.encode(&standard_columns());
        let occupation_hits: f64 = standard_columns()
            .iter()
            .zip(&encoded)
            .filter(|(col, _)| col.starts_with("occupation_"))
            .map(|(_, v)| v)
            .sum();
        assert!(occupation_hits.abs() < f64::EPSILON);
    }
}
