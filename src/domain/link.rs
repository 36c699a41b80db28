use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Account, AccountId, Cents, UserId};

/// A user's association with an account.
///
/// `current_balance_cents` is a cache of
/// `initial_balance_cents + Σcredit − Σdebit` over the user's expenses on this
/// account dated on or after `date_of_initial_balance`. It is only ever moved
/// by an atomic store-side adjustment in the same transaction as the expense
/// write that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLink {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub initial_balance_cents: Cents,
    pub current_balance_cents: Cents,
    pub date_of_initial_balance: NaiveDate,
    pub linked_at: DateTime<Utc>,
}

impl AccountLink {
    /// A fresh link starts with its current balance equal to the initial one.
    pub fn new(
        user_id: UserId,
        account_id: AccountId,
        initial_balance_cents: Cents,
        date_of_initial_balance: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            account_id,
            initial_balance_cents,
            current_balance_cents: initial_balance_cents,
            date_of_initial_balance,
            linked_at: Utc::now(),
        }
    }

    /// Link using the account's own baseline unless overridden.
    pub fn for_account(
        user_id: UserId,
        account: &Account,
        initial_balance_cents: Option<Cents>,
        date_of_initial_balance: Option<NaiveDate>,
    ) -> Self {
        Self::new(
            user_id,
            account.id,
            initial_balance_cents.unwrap_or(account.initial_balance_cents),
            date_of_initial_balance.unwrap_or(account.initial_balance_date),
        )
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::AccountType;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_link_starts_at_initial_balance() {
        let link = AccountLink::new(Uuid::new_v4(), Uuid::new_v4(), 12_500, date("2024-01-01"));
        assert_eq!(link.current_balance_cents, 12_500);
    }

    #[test]
    fn test_link_defaults_to_account_baseline() {
        let account = Account::new(
            "Visa".into(),
            AccountType::Credit,
            "#ff0000".into(),
            -3000,
            date("2023-06-01"),
        );
        let user = Uuid::new_v4();

        let inherited = AccountLink::for_account(user, &account, None, None);
        assert_eq!(inherited.initial_balance_cents, -3000);
        assert_eq!(inherited.date_of_initial_balance, date("2023-06-01"));

        let overridden = AccountLink::for_account(user, &account, Some(0), Some(date("2024-02-01")));
        assert_eq!(overridden.initial_balance_cents, 0);
        assert_eq!(overridden.current_balance_cents, 0);
        assert_eq!(overridden.date_of_initial_balance, date("2024-02-01"));
    }
}
