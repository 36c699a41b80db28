//! Field-level input validation.
//!
//! Every check collects all of its failures instead of stopping at the first,
//! so callers can report a complete list of `{name, message}` pairs.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    is_hex_color, parse_cents, AccountId, AccountType, Cents, Expense, MonthWindow,
    ParseCentsError, EPOCH_YEAR, MAX_AMOUNT_CENTS,
};

/// Input fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Date,
    AccountId,
    Credit,
    Debit,
    Category,
    Notes,
    Name,
    Type,
    Color,
    InitialBalance,
    InitialBalanceDate,
    Email,
    Year,
    Month,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::AccountId => "accountId",
            Field::Credit => "credit",
            Field::Debit => "debit",
            Field::Category => "category",
            Field::Notes => "notes",
            Field::Name => "name",
            Field::Type => "type",
            Field::Color => "color",
            Field::InitialBalance => "initialBalance",
            Field::InitialBalanceDate => "initialBalanceDate",
            Field::Email => "email",
            Field::Year => "year",
            Field::Month => "month",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub name: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(name: Field, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Whether expenses may be dated after today.
///
/// Applied to every expense write (create and update alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FutureDatePolicy {
    #[default]
    Reject,
    Allow,
}

impl FutureDatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FutureDatePolicy::Reject => "reject",
            FutureDatePolicy::Allow => "allow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Some(FutureDatePolicy::Reject),
            "allow" => Some(FutureDatePolicy::Allow),
            _ => None,
        }
    }
}

fn parse_date_field(field: Field, raw: &str, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is a required field")));
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(field, format!("{field} is invalid")));
            None
        }
    }
}

fn parse_amount_field(field: Field, raw: &str, errors: &mut Vec<FieldError>) -> Option<Cents> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is a required field")));
        return None;
    }
    match parse_cents(raw) {
        Ok(cents) => Some(cents),
        Err(ParseCentsError::TooPrecise) => {
            errors.push(FieldError::new(
                field,
                format!("{field} has more than two decimal places"),
            ));
            None
        }
        Err(_) => {
            errors.push(FieldError::new(field, format!("{field} must be a number")));
            None
        }
    }
}

fn too_large(field: Field) -> FieldError {
    FieldError::new(
        field,
        format!("{field} must not exceed {}", super::format_cents(MAX_AMOUNT_CENTS)),
    )
}

/// Check an opening balance, which may be negative, against the amount limit.
pub fn validate_initial_balance(cents: Cents) -> Vec<FieldError> {
    if cents.unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
        vec![too_large(Field::InitialBalance)]
    } else {
        Vec::new()
    }
}

/// A validated request to record an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub credit_cents: Cents,
    pub debit_cents: Cents,
    pub category: String,
    pub notes: Option<String>,
}

impl NewExpense {
    pub fn validate(&self, today: NaiveDate, policy: FutureDatePolicy) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if policy == FutureDatePolicy::Reject && self.date > today {
            errors.push(FieldError::new(Field::Date, "date cannot be in the future"));
        }
        if self.credit_cents < 0 {
            errors.push(FieldError::new(Field::Credit, "credit must not be negative"));
        } else if self.credit_cents > MAX_AMOUNT_CENTS {
            errors.push(too_large(Field::Credit));
        }
        if self.debit_cents < 0 {
            errors.push(FieldError::new(Field::Debit, "debit must not be negative"));
        } else if self.debit_cents > MAX_AMOUNT_CENTS {
            errors.push(too_large(Field::Debit));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new(Field::Category, "category cannot be empty"));
        }
        errors
    }
}

/// Raw, unparsed expense input as it arrives from a form or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub date: String,
    pub account_id: String,
    pub credit: String,
    pub debit: String,
    pub category: String,
    pub notes: Option<String>,
}

/// A change to a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseEdit {
    Date(String),
    Account(String),
    Credit(String),
    Debit(String),
    Category(String),
    Notes(Option<String>),
}

impl ExpenseForm {
    /// Prefill a form with an existing expense, e.g. before editing it.
    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            date: expense.date.format("%Y-%m-%d").to_string(),
            account_id: expense.account_id.to_string(),
            credit: super::format_cents(expense.credit_cents),
            debit: super::format_cents(expense.debit_cents),
            category: expense.category.clone(),
            notes: expense.notes.clone(),
        }
    }

    pub fn apply(&mut self, edit: ExpenseEdit) {
        match edit {
            ExpenseEdit::Date(date) => self.date = date,
            ExpenseEdit::Account(account_id) => self.account_id = account_id,
            ExpenseEdit::Credit(credit) => self.credit = credit,
            ExpenseEdit::Debit(debit) => self.debit = debit,
            ExpenseEdit::Category(category) => self.category = category,
            ExpenseEdit::Notes(notes) => self.notes = notes,
        }
    }

    pub fn parse(
        &self,
        today: NaiveDate,
        policy: FutureDatePolicy,
    ) -> Result<NewExpense, Vec<FieldError>> {
        let mut errors = Vec::new();

        let date = parse_date_field(Field::Date, &self.date, &mut errors);
        let account_id = match self.account_id.trim() {
            "" => {
                errors.push(FieldError::new(Field::AccountId, "accountId is a required field"));
                None
            }
            raw => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError::new(
                        Field::AccountId,
                        "accountId is not a valid account id",
                    ));
                    None
                }
            },
        };
        let credit_cents = parse_amount_field(Field::Credit, &self.credit, &mut errors);
        let debit_cents = parse_amount_field(Field::Debit, &self.debit, &mut errors);
        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let (Some(date), Some(account_id), Some(credit_cents), Some(debit_cents)) =
            (date, account_id, credit_cents, debit_cents)
        else {
            // Report the semantic checks that don't depend on the failed fields too
            if self.category.trim().is_empty() {
                errors.push(FieldError::new(Field::Category, "category cannot be empty"));
            }
            return Err(errors);
        };

        let expense = NewExpense {
            account_id,
            date,
            credit_cents,
            debit_cents,
            category: self.category.trim().to_string(),
            notes,
        };
        errors.extend(expense.validate(today, policy));

        if errors.is_empty() {
            Ok(expense)
        } else {
            Err(errors)
        }
    }
}

/// A validated request to register an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub color: String,
    pub initial_balance_cents: Cents,
    pub initial_balance_date: NaiveDate,
}

impl NewAccount {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new(Field::Name, "name cannot be empty"));
        }
        if self.color.trim().is_empty() {
            errors.push(FieldError::new(Field::Color, "color cannot be empty"));
        } else if !is_hex_color(self.color.trim()) {
            errors.push(FieldError::new(Field::Color, "color must be a valid hex color"));
        }
        errors.extend(validate_initial_balance(self.initial_balance_cents));
        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountForm {
    pub name: String,
    pub account_type: String,
    pub color: String,
    pub initial_balance: String,
    pub initial_balance_date: String,
}

impl AccountForm {
    pub fn parse(&self) -> Result<NewAccount, Vec<FieldError>> {
        let mut errors = Vec::new();

        let account_type = match self.account_type.trim() {
            "" => {
                errors.push(FieldError::new(Field::Type, "type is a required field"));
                None
            }
            raw => {
                let parsed = AccountType::from_str(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new(Field::Type, "type must be either Credit or Debit"));
                }
                parsed
            }
        };
        let initial_balance_cents =
            parse_amount_field(Field::InitialBalance, &self.initial_balance, &mut errors);
        let initial_balance_date =
            parse_date_field(Field::InitialBalanceDate, &self.initial_balance_date, &mut errors);

        let candidate = NewAccount {
            name: self.name.trim().to_string(),
            account_type: account_type.unwrap_or(AccountType::Debit),
            color: self.color.trim().to_string(),
            initial_balance_cents: initial_balance_cents.unwrap_or_default(),
            initial_balance_date: initial_balance_date.unwrap_or_default(),
        };
        errors.extend(candidate.validate());

        if errors.is_empty() {
            Ok(candidate)
        } else {
            Err(errors)
        }
    }
}

pub fn validate_new_user(name: &str, email: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new(Field::Name, "name cannot be empty"));
    }
    let email = email.trim();
    if email.is_empty() {
        errors.push(FieldError::new(Field::Email, "email cannot be empty"));
    } else {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            errors.push(FieldError::new(Field::Email, "email is invalid"));
        }
    }
    errors
}

/// Check a ledger request and turn it into a month window.
/// Years run from [`EPOCH_YEAR`] up to the current year.
pub fn validate_month(year: i32, month: u32, today: NaiveDate) -> Result<MonthWindow, Vec<FieldError>> {
    let mut errors = Vec::new();
    if year < EPOCH_YEAR {
        errors.push(FieldError::new(
            Field::Year,
            format!("year must be {EPOCH_YEAR} or later"),
        ));
    } else if year > today.year() {
        errors.push(FieldError::new(Field::Year, "year cannot be in the future"));
    }
    if !(1..=12).contains(&month) {
        errors.push(FieldError::new(Field::Month, "month must be between 1 and 12"));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    MonthWindow::new(year, month)
        .ok_or_else(|| vec![FieldError::new(Field::Month, "month is invalid")])
}
