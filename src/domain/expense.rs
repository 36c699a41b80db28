use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents, UserId};

pub type ExpenseId = Uuid;

/// A dated credit/debit movement on one of a user's linked accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Insertion order, assigned by the repository. Breaks ties between
    /// expenses on the same day.
    pub sequence: i64,
    pub user_id: UserId,
    pub account_id: AccountId,
    /// Only the calendar day matters
    pub date: NaiveDate,
    /// Money added to the balance (never negative)
    pub credit_cents: Cents,
    /// Money taken from the balance (never negative)
    pub debit_cents: Cents,
    pub category: String,
    pub notes: Option<String>,
    /// When the expense was written to the store
    pub recorded_at: DateTime<Utc>,
}

impl Expense {
    /// Create a new expense. Sequence number must be assigned by the repository.
    pub fn new(
        user_id: UserId,
        account_id: AccountId,
        date: NaiveDate,
        credit_cents: Cents,
        debit_cents: Cents,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            user_id,
            account_id,
            date,
            credit_cents,
            debit_cents,
            category: category.into(),
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Signed effect on the account balance.
    pub fn net_cents(&self) -> Cents {
        self.credit_cents - self.debit_cents
    }
}
