use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    check_link_balances, compute_monthly_ledger, validate_initial_balance, validate_month,
    validate_new_user, Account, AccountId, AccountLink, AccountSummary, BalanceCheck, Cents,
    Expense, ExpenseEdit, ExpenseForm, ExpenseId, FutureDatePolicy, MonthlyLedger, NewAccount,
    NewExpense, User, UserId,
};
use crate::storage::{BalanceWrite, Repository};

use super::{AppError, Session};

/// Application service providing the tracker's use cases.
/// This is the primary interface for any client (CLI, API, etc.).
#[derive(Clone)]
pub struct LedgerService {
    repo: Repository,
    future_dates: FutureDatePolicy,
}

/// A linked account together with the user's balance state for it
#[derive(Debug, Clone, Serialize)]
pub struct LinkedAccount {
    pub account: Account,
    pub link: AccountLink,
}

impl LedgerService {
    pub fn new(repo: Repository, future_dates: FutureDatePolicy) -> Self {
        Self { repo, future_dates }
    }

    /// Create (if needed) and migrate the database described by `config`.
    pub async fn init(config: &Config) -> Result<Self, AppError> {
        let repo = Repository::init(config.connect_options(true), config.max_connections).await?;
        tracing::info!("initialized database at {}", config.database.display());
        Ok(Self::new(repo, config.future_dates))
    }

    /// Connect to an existing database.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let repo =
            Repository::connect(config.connect_options(false), config.max_connections).await?;
        Ok(Self::new(repo, config.future_dates))
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // ========================
    // User operations
    // ========================

    pub async fn create_user(&self, name: String, email: String) -> Result<User, AppError> {
        let errors = validate_new_user(&name, &email);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let user = User::new(name.trim().to_string(), email.trim().to_lowercase());
        if !self.repo.save_user(&user).await? {
            return Err(AppError::UserAlreadyExists(user.email));
        }

        tracing::info!(user = %user.id, "created user {}", user.email);
        Ok(user)
    }

    /// Resolve the identity a request acts as.
    pub async fn open_session(&self, email: &str) -> Result<Session, AppError> {
        let email = email.trim().to_lowercase();
        match self.repo.get_user_by_email(&email).await? {
            Some(user) => Ok(Session::for_user(&user)),
            None => {
                tracing::warn!("rejected session for unknown user {email}");
                Err(AppError::Unauthorized(format!("unknown user {email}")))
            }
        }
    }

    /// The session's user, which must still exist.
    pub async fn get_user(&self, session: &Session) -> Result<User, AppError> {
        self.repo
            .get_user(session.user_id())
            .await?
            .ok_or_else(|| AppError::UserNotFound(session.email().to_string()))
    }

    // ========================
    // Account operations
    // ========================

    pub async fn create_account(&self, new_account: NewAccount) -> Result<Account, AppError> {
        let errors = new_account.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let account = Account::new(
            new_account.name.trim().to_string(),
            new_account.account_type,
            new_account.color.trim().to_string(),
            new_account.initial_balance_cents,
            new_account.initial_balance_date,
        );
        self.repo.save_account(&account).await?;

        tracing::info!(account = %account.id, "created {} account {}", account.account_type, account.name);
        Ok(account)
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Look an account up by ID, falling back to its name.
    pub async fn find_account(&self, id_or_name: &str) -> Result<Account, AppError> {
        if let Ok(id) = Uuid::parse_str(id_or_name.trim()) {
            return self.get_account(id).await;
        }
        self.repo
            .get_account_by_name(id_or_name.trim())
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id_or_name.to_string()))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Link operations
    // ========================

    /// Link an account to the session's user. The link's baseline defaults to
    /// the account's own initial balance and date.
    pub async fn link_account(
        &self,
        session: &Session,
        account_id: AccountId,
        initial_balance_cents: Option<Cents>,
        date_of_initial_balance: Option<NaiveDate>,
    ) -> Result<AccountLink, AppError> {
        if let Some(cents) = initial_balance_cents {
            let errors = validate_initial_balance(cents);
            if !errors.is_empty() {
                return Err(AppError::Validation(errors));
            }
        }

        let user = self.get_user(session).await?;
        let account = self.get_account(account_id).await?;

        if self.repo.get_link(user.id, account.id).await?.is_some() {
            return Err(AppError::DuplicateLink(account.id));
        }

        let link = AccountLink::for_account(
            user.id,
            &account,
            initial_balance_cents,
            date_of_initial_balance,
        );
        // A concurrent link for the same pair loses on the primary key.
        if !self.repo.save_link(&link).await? {
            return Err(AppError::DuplicateLink(account.id));
        }

        tracing::info!(user = %user.id, account = %account.id, "linked account {}", account.name);
        Ok(link)
    }

    pub async fn list_links(&self, session: &Session) -> Result<Vec<LinkedAccount>, AppError> {
        let user = self.get_user(session).await?;
        let links = self.repo.list_links_for_user(user.id).await?;
        let mut accounts: HashMap<AccountId, Account> = self
            .repo
            .list_accounts()
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        links
            .into_iter()
            .map(|link| {
                let account = accounts
                    .remove(&link.account_id)
                    .ok_or_else(|| AppError::AccountNotFound(link.account_id.to_string()))?;
                Ok(LinkedAccount { account, link })
            })
            .collect()
    }

    // ========================
    // Expense operations
    // ========================

    /// Record an expense and move the linked account's balance with it.
    ///
    /// Input is validated first, then the user and link are checked; only then
    /// are the balance and expense written, together or not at all.
    pub async fn record_expense(
        &self,
        session: &Session,
        new_expense: NewExpense,
    ) -> Result<Expense, AppError> {
        let errors = new_expense.validate(Self::today(), self.future_dates);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let user = self.get_user(session).await?;
        self.ensure_linked(user.id, new_expense.account_id).await?;

        let mut expense = Expense::new(
            user.id,
            new_expense.account_id,
            new_expense.date,
            new_expense.credit_cents,
            new_expense.debit_cents,
            new_expense.category,
        );
        if let Some(notes) = new_expense.notes {
            expense = expense.with_notes(notes);
        }

        match self.repo.record_expense(&mut expense).await? {
            BalanceWrite::Applied(balance) => {
                tracing::info!(
                    user = %user.id,
                    account = %expense.account_id,
                    delta = expense.net_cents(),
                    balance,
                    "recorded expense {}",
                    expense.id
                );
                Ok(expense)
            }
            // Inserts never look up an existing row
            BalanceWrite::MissingLink | BalanceWrite::MissingExpense => {
                Err(AppError::AccountNotLinked(expense.account_id))
            }
        }
    }

    /// Parse raw form input and record it.
    pub async fn submit_expense(
        &self,
        session: &Session,
        form: &ExpenseForm,
    ) -> Result<Expense, AppError> {
        let new_expense = form.parse(Self::today(), self.future_dates)?;
        self.record_expense(session, new_expense).await
    }

    /// Get one of the session user's expenses.
    pub async fn get_expense(&self, session: &Session, id: ExpenseId) -> Result<Expense, AppError> {
        match self.repo.get_expense(id).await? {
            Some(expense) if expense.user_id == session.user_id() => Ok(expense),
            _ => Err(AppError::ExpenseNotFound(id.to_string())),
        }
    }

    /// Every expense of the session user, oldest first.
    pub async fn list_expenses(&self, session: &Session) -> Result<Vec<Expense>, AppError> {
        let user = self.get_user(session).await?;
        Ok(self.repo.list_expenses_for_user(user.id).await?)
    }

    /// Apply field edits to an expense. The old amount leaves its account and
    /// the new amount enters the (possibly different) target account in the
    /// same transaction as the row update.
    pub async fn update_expense(
        &self,
        session: &Session,
        id: ExpenseId,
        edits: Vec<ExpenseEdit>,
    ) -> Result<Expense, AppError> {
        let old = self.get_expense(session, id).await?;

        let mut form = ExpenseForm::from_expense(&old);
        for edit in edits {
            form.apply(edit);
        }
        let parsed = form.parse(Self::today(), self.future_dates)?;

        if parsed.account_id != old.account_id {
            self.ensure_linked(old.user_id, parsed.account_id).await?;
        }

        let updated = Expense {
            account_id: parsed.account_id,
            date: parsed.date,
            credit_cents: parsed.credit_cents,
            debit_cents: parsed.debit_cents,
            category: parsed.category,
            notes: parsed.notes,
            ..old.clone()
        };

        match self.repo.update_expense(&updated).await? {
            BalanceWrite::Applied(balance) => {
                tracing::info!(
                    user = %updated.user_id,
                    account = %updated.account_id,
                    balance,
                    "updated expense {}",
                    updated.id
                );
                Ok(updated)
            }
            BalanceWrite::MissingLink => Err(AppError::AccountNotLinked(updated.account_id)),
            BalanceWrite::MissingExpense => Err(AppError::ExpenseNotFound(id.to_string())),
        }
    }

    /// Delete an expense and revert its effect on the account balance.
    pub async fn delete_expense(&self, session: &Session, id: ExpenseId) -> Result<Expense, AppError> {
        let mut expense = self.get_expense(session, id).await?;

        match self.repo.delete_expense(&mut expense).await? {
            BalanceWrite::Applied(balance) => {
                tracing::info!(
                    user = %expense.user_id,
                    account = %expense.account_id,
                    balance,
                    "deleted expense {}",
                    expense.id
                );
                Ok(expense)
            }
            BalanceWrite::MissingLink => Err(AppError::AccountNotLinked(expense.account_id)),
            BalanceWrite::MissingExpense => Err(AppError::ExpenseNotFound(id.to_string())),
        }
    }

    async fn ensure_linked(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<(), AppError> {
        if self.repo.get_link(user_id, account_id).await?.is_some() {
            return Ok(());
        }
        if self.repo.get_account(account_id).await?.is_none() {
            return Err(AppError::AccountNotFound(account_id.to_string()));
        }
        Err(AppError::AccountNotLinked(account_id))
    }

    // ========================
    // Ledger operations
    // ========================

    /// Expenses of one month with the running balance of their account, plus
    /// per-account start/end balances and totals.
    pub async fn monthly_ledger(
        &self,
        session: &Session,
        year: i32,
        month: u32,
    ) -> Result<MonthlyLedger, AppError> {
        let window = validate_month(year, month, Self::today())?;
        let user = self.get_user(session).await?;

        let snapshot = self.repo.ledger_snapshot(user.id, &window).await?;
        let ledger = compute_monthly_ledger(
            window,
            &snapshot.links,
            &snapshot.account_names,
            snapshot.prior.iter().chain(&snapshot.in_window),
        );

        tracing::debug!(
            user = %user.id,
            prior = snapshot.prior.len(),
            rows = ledger.rows.len(),
            accounts = ledger.summaries.len(),
            "computed ledger for {window}"
        );
        Ok(ledger)
    }

    pub async fn account_summaries(
        &self,
        session: &Session,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<AccountId, AccountSummary>, AppError> {
        Ok(self.monthly_ledger(session, year, month).await?.summaries)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Compare each link's cached balance with the one derived from the
    /// expense log.
    pub async fn check_balances(&self, session: &Session) -> Result<Vec<BalanceCheck>, AppError> {
        let user = self.get_user(session).await?;
        let links = self.repo.list_links_for_user(user.id).await?;
        let names = self.repo.account_names_for_user(user.id).await?;
        let expenses = self.repo.list_expenses_for_user(user.id).await?;

        let checks = check_link_balances(&links, &names, &expenses);
        for check in checks.iter().filter(|c| !c.is_consistent()) {
            tracing::warn!(
                account = %check.account_id,
                cached = check.cached_cents,
                derived = check.derived_cents,
                "cached balance of {} drifted from the expense log",
                check.account_name
            );
        }
        Ok(checks)
    }
}
