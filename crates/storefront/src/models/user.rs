//! Storefront account type.

use chrono::{DateTime, Utc};

use shopfront_core::{AccountId, CustomerId, Email};

/// A storefront login bound to a customer record.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub customer_id: CustomerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Name for the header: first name, else the email local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.first_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(
                || {
                    self.email
                        .as_str()
                        .split('@')
                        .next()
                        .unwrap_or_default()
                        .to_string()
                },
                str::to_string,
            )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(first_name: Option<&str>) -> Account {
        Account {
            id: AccountId::new(1),
            email: Email::parse("lee.wei@example.sg").unwrap(),
            customer_id: CustomerId::new(9),
            first_name: first_name.map(str::to_string),
            last_name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_first_name() {
        assert_eq!(account(Some("Wei")).display_name(), "Wei");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(account(None).display_name(), "lee.wei");
        assert_eq!(account(Some("  ")).display_name(), "lee.wei");
    }
}
