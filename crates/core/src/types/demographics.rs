//! Customer demographic choices.
//!
//! Stored as plain text because imported customer files carry values outside
//! these lists. The enums define what the profile form offers and the
//! defaults the CSV import falls back to.

use serde::{Deserialize, Serialize};

macro_rules! text_choice {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Case-insensitive lookup of a stored or submitted value.
            #[must_use]
            pub fn from_text(s: &str) -> Option<Self> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice.as_str().eq_ignore_ascii_case(s))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_choice! {
    /// Customer gender. Imports default to `Male`.
    Gender {
        Male => "Male",
        Female => "Female",
    }
}

text_choice! {
    /// Employment status. Imports default to `Full-time`.
    EmploymentStatus {
        FullTime => "Full-time",
        PartTime => "Part-time",
        Student => "Student",
        SelfEmployed => "Self-employed",
        Retired => "Retired",
    }
}

text_choice! {
    /// Highest education level. Imports default to `Secondary`.
    Education {
        Secondary => "Secondary",
        Diploma => "Diploma",
        Bachelor => "Bachelor",
        Master => "Master",
        Doctorate => "Doctorate",
    }
}

impl Default for Gender {
    fn default() -> Self {
        Self::Male
    }
}

impl Default for EmploymentStatus {
    fn default() -> Self {
        Self::FullTime
    }
}

impl Default for Education {
    fn default() -> Self {
        Self::Secondary
    }
}

/// Occupations offered on the profile form. Free text is still accepted.
pub const OCCUPATIONS: &[&str] = &["Admin", "Education", "Sales", "Service", "Skilled Trades", "Tech"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_case_insensitive() {
        assert_eq!(Gender::from_text("female"), Some(Gender::Female));
        assert_eq!(EmploymentStatus::from_text(" self-employed "), Some(EmploymentStatus::SelfEmployed));
        assert_eq!(Education::from_text("PhD"), None);
    }

    #[test]
    fn test_defaults_match_import_fallbacks() {
        assert_eq!(Gender::default().as_str(), "Male");
        assert_eq!(EmploymentStatus::default().as_str(), "Full-time");
        assert_eq!(Education::default().as_str(), "Secondary");
    }
}
