use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type AccountId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Credit cards and other borrowed money
    Credit,
    /// Debit cards backed by a bank balance
    Debit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Credit => "Credit",
            AccountType::Debit => "Debit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" => Some(AccountType::Credit),
            "debit" => Some(AccountType::Debit),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A card registered in the system.
///
/// `initial_balance_cents` and `initial_balance_date` are fixed at creation and
/// anchor every balance derived for this account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    /// Display color as `#RRGGBB`
    pub color: String,
    pub initial_balance_cents: Cents,
    pub initial_balance_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: String,
        account_type: AccountType,
        color: String,
        initial_balance_cents: Cents,
        initial_balance_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            account_type,
            color,
            initial_balance_cents,
            initial_balance_date,
            created_at: Utc::now(),
        }
    }
}

/// Returns true for colors written as `#RRGGBB`.
pub fn is_hex_color(color: &str) -> bool {
    color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_parsing_is_case_insensitive() {
        assert_eq!(AccountType::from_str("Credit"), Some(AccountType::Credit));
        assert_eq!(AccountType::from_str("debit"), Some(AccountType::Debit));
        assert_eq!(AccountType::from_str("savings"), None);
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#1a2B3c"));
        assert!(!is_hex_color("1a2b3c"));
        assert!(!is_hex_color("#1a2b3"));
        assert!(!is_hex_color("#1a2b3g"));
        assert!(!is_hex_color(""));
    }
}
