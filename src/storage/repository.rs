use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountLink, AccountType, Cents, Expense, ExpenseId, MonthWindow, User,
    UserId,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

const EXPENSE_COLUMNS: &str = "id, sequence, user_id, account_id, date, credit_cents, debit_cents, category, notes, recorded_at";

/// Everything the monthly ledger needs, read inside one transaction so the
/// pieces agree with each other.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub links: Vec<AccountLink>,
    pub account_names: HashMap<AccountId, String>,
    /// Dated strictly before the window
    pub prior: Vec<Expense>,
    /// Dated inside the window, by date then sequence
    pub in_window: Vec<Expense>,
}

/// Outcome of a write that must adjust one or more link balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceWrite {
    /// Committed; carries the new balance of the link that was written last
    Applied(Cents),
    /// A referenced link does not exist; nothing was written
    MissingLink,
    /// The expense is gone (or belongs to someone else); nothing was written
    MissingExpense,
}

/// Repository for persisting and querying users, accounts, links and expenses.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool with the given connection options.
    pub async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let repo = Self::connect(options, max_connections).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    /// Save a new user. Returns false if the email is already taken.
    pub async fn save_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to save user")),
        }
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by email")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            email: row.get("email"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, account_type, color, initial_balance_cents, initial_balance_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(account.account_type.as_str())
        .bind(&account.color)
        .bind(account.initial_balance_cents)
        .bind(account.initial_balance_date.format(DATE_FORMAT).to_string())
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, account_type, color, initial_balance_cents, initial_balance_date, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Get the oldest account with the given name.
    pub async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, account_type, color, initial_balance_cents, initial_balance_date, created_at
            FROM accounts
            WHERE name = ?
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by name")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, account_type, color, initial_balance_cents, initial_balance_date, created_at
            FROM accounts
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Names of the accounts a user is linked to.
    async fn fetch_account_names<'e, E>(
        executor: E,
        user_id: UserId,
    ) -> Result<HashMap<AccountId, String>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.name
            FROM accounts a
            JOIN account_links l ON l.account_id = a.id
            WHERE l.user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(executor)
        .await
        .context("Failed to fetch account names")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let id = Uuid::parse_str(&id_str).context("Invalid account ID")?;
                Ok((id, row.get::<String, _>("name")))
            })
            .collect()
    }

    pub async fn account_names_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<AccountId, String>> {
        Self::fetch_account_names(&self.pool, user_id).await
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let account_type_str: String = row.get("account_type");
        let date_str: String = row.get("initial_balance_date");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            name: row.get("name"),
            account_type: AccountType::from_str(&account_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account type: {}", account_type_str))?,
            color: row.get("color"),
            initial_balance_cents: row
                .try_get("initial_balance_cents")
                .context("Invalid initial balance")?,
            initial_balance_date: parse_date(&date_str)?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Link operations
    // ========================

    /// Save a new link. Returns false if the user is already linked to the account.
    pub async fn save_link(&self, link: &AccountLink) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO account_links (user_id, account_id, initial_balance_cents, current_balance_cents, date_of_initial_balance, linked_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.user_id.to_string())
        .bind(link.account_id.to_string())
        .bind(link.initial_balance_cents)
        .bind(link.current_balance_cents)
        .bind(link.date_of_initial_balance.format(DATE_FORMAT).to_string())
        .bind(link.linked_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to save link")),
        }
    }

    pub async fn get_link(&self, user_id: UserId, account_id: AccountId) -> Result<Option<AccountLink>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, account_id, initial_balance_cents, current_balance_cents, date_of_initial_balance, linked_at
            FROM account_links
            WHERE user_id = ? AND account_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch link")?;

        row.as_ref().map(Self::row_to_link).transpose()
    }

    async fn fetch_links<'e, E>(executor: E, user_id: UserId) -> Result<Vec<AccountLink>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query(
            r#"
            SELECT user_id, account_id, initial_balance_cents, current_balance_cents, date_of_initial_balance, linked_at
            FROM account_links
            WHERE user_id = ?
            ORDER BY linked_at
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(executor)
        .await
        .context("Failed to list links")?;

        rows.iter().map(Self::row_to_link).collect()
    }

    pub async fn list_links_for_user(&self, user_id: UserId) -> Result<Vec<AccountLink>> {
        Self::fetch_links(&self.pool, user_id).await
    }

    /// Move a link's cached balance by `delta_cents` in a single statement.
    /// Returns the new balance, or `None` if the link does not exist.
    async fn adjust_balance_with<'e, E>(
        executor: E,
        user_id: UserId,
        account_id: AccountId,
        delta_cents: Cents,
    ) -> Result<Option<Cents>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query(
            r#"
            UPDATE account_links
            SET current_balance_cents = current_balance_cents + ?
            WHERE user_id = ? AND account_id = ?
            RETURNING current_balance_cents
            "#,
        )
        .bind(delta_cents)
        .bind(user_id.to_string())
        .bind(account_id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to adjust balance")?;

        row.map(|row| {
            row.try_get::<Cents, _>("current_balance_cents")
                .context("Balance is not an integer")
        })
        .transpose()
    }

    pub async fn adjust_balance(
        &self,
        user_id: UserId,
        account_id: AccountId,
        delta_cents: Cents,
    ) -> Result<Option<Cents>> {
        Self::adjust_balance_with(&self.pool, user_id, account_id, delta_cents).await
    }

    fn row_to_link(row: &SqliteRow) -> Result<AccountLink> {
        let user_id_str: String = row.get("user_id");
        let account_id_str: String = row.get("account_id");
        let date_str: String = row.get("date_of_initial_balance");
        let linked_at_str: String = row.get("linked_at");

        Ok(AccountLink {
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            initial_balance_cents: row
                .try_get("initial_balance_cents")
                .context("Invalid initial balance")?,
            current_balance_cents: row
                .try_get("current_balance_cents")
                .context("Invalid current balance")?,
            date_of_initial_balance: parse_date(&date_str)?,
            linked_at: parse_timestamp(&linked_at_str)?,
        })
    }

    // ========================
    // Expense operations
    // ========================

    /// Write an expense and move its link's balance in one transaction.
    ///
    /// The balance adjustment runs first so the transaction takes the write
    /// lock before reading anything. If any step fails the transaction is
    /// dropped and rolled back, leaving neither change visible.
    pub async fn record_expense(&self, expense: &mut Expense) -> Result<BalanceWrite> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let Some(new_balance) = Self::adjust_balance_with(
            &mut *tx,
            expense.user_id,
            expense.account_id,
            expense.net_cents(),
        )
        .await?
        else {
            return Ok(BalanceWrite::MissingLink);
        };

        expense.sequence = Self::next_sequence(&mut *tx).await?;
        Self::insert_expense(&mut *tx, expense).await?;

        tx.commit().await.context("Failed to commit expense")?;
        Ok(BalanceWrite::Applied(new_balance))
    }

    /// Replace an expense, moving the stored amount out of its link and the
    /// new amount into (possibly another) link, all in one transaction.
    ///
    /// The stored row is read inside the transaction, so concurrent edits each
    /// revert what the previous one wrote rather than a stale copy.
    pub async fn update_expense(&self, expense: &Expense) -> Result<BalanceWrite> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // A no-op write on the row takes the write lock before anything is read
        let stored = sqlx::query(&format!(
            "UPDATE expenses SET sequence = sequence WHERE id = ? AND user_id = ? RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(expense.id.to_string())
        .bind(expense.user_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock expense")?;
        let Some(stored) = stored else {
            return Ok(BalanceWrite::MissingExpense);
        };
        let stored = Self::row_to_expense(&stored)?;

        if Self::adjust_balance_with(
            &mut *tx,
            stored.user_id,
            stored.account_id,
            -stored.net_cents(),
        )
        .await?
        .is_none()
        {
            return Ok(BalanceWrite::MissingLink);
        }
        let Some(new_balance) = Self::adjust_balance_with(
            &mut *tx,
            expense.user_id,
            expense.account_id,
            expense.net_cents(),
        )
        .await?
        else {
            return Ok(BalanceWrite::MissingLink);
        };

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET account_id = ?, date = ?, credit_cents = ?, debit_cents = ?, category = ?, notes = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(expense.account_id.to_string())
        .bind(expense.date.format(DATE_FORMAT).to_string())
        .bind(expense.credit_cents)
        .bind(expense.debit_cents)
        .bind(&expense.category)
        .bind(&expense.notes)
        .bind(expense.id.to_string())
        .bind(expense.user_id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to update expense")?;
        if result.rows_affected() != 1 {
            return Ok(BalanceWrite::MissingExpense);
        }

        tx.commit().await.context("Failed to commit expense update")?;
        Ok(BalanceWrite::Applied(new_balance))
    }

    /// Remove an expense and take its amount back out of the link balance.
    ///
    /// The row is deleted first and the balance reverted by what was actually
    /// removed, so a second delete of the same expense finds nothing.
    /// On success `expense` is overwritten with the deleted row.
    pub async fn delete_expense(&self, expense: &mut Expense) -> Result<BalanceWrite> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let deleted = sqlx::query(&format!(
            "DELETE FROM expenses WHERE id = ? AND user_id = ? RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(expense.id.to_string())
        .bind(expense.user_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to delete expense")?;
        let Some(deleted) = deleted else {
            return Ok(BalanceWrite::MissingExpense);
        };
        let deleted = Self::row_to_expense(&deleted)?;

        let Some(new_balance) = Self::adjust_balance_with(
            &mut *tx,
            deleted.user_id,
            deleted.account_id,
            -deleted.net_cents(),
        )
        .await?
        else {
            return Ok(BalanceWrite::MissingLink);
        };

        tx.commit().await.context("Failed to commit expense deletion")?;
        *expense = deleted;
        Ok(BalanceWrite::Applied(new_balance))
    }

    async fn insert_expense<'e, E>(executor: E, expense: &Expense) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO expenses (id, sequence, user_id, account_id, date, credit_cents, debit_cents, category, notes, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(expense.sequence)
        .bind(expense.user_id.to_string())
        .bind(expense.account_id.to_string())
        .bind(expense.date.format(DATE_FORMAT).to_string())
        .bind(expense.credit_cents)
        .bind(expense.debit_cents)
        .bind(&expense.category)
        .bind(&expense.notes)
        .bind(expense.recorded_at.to_rfc3339())
        .execute(executor)
        .await
        .context("Failed to save expense")?;
        Ok(())
    }

    /// Get the next sequence number and increment the counter.
    async fn next_sequence<'e, E>(executor: E) -> Result<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'expense_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(executor)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    /// Get an expense by ID.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let row = sqlx::query(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch expense")?;

        row.as_ref().map(Self::row_to_expense).transpose()
    }

    /// All of a user's expenses, by date then sequence.
    pub async fn list_expenses_for_user(&self, user_id: UserId) -> Result<Vec<Expense>> {
        let rows = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = ? ORDER BY date, sequence"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    async fn fetch_expenses_before<'e, E>(
        executor: E,
        user_id: UserId,
        before: NaiveDate,
    ) -> Result<Vec<Expense>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = ? AND date < ?"
        ))
        .bind(user_id.to_string())
        .bind(before.format(DATE_FORMAT).to_string())
        .fetch_all(executor)
        .await
        .context("Failed to list expenses before date")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    /// A user's expenses dated strictly before `before`, in no particular order.
    pub async fn list_expenses_before(
        &self,
        user_id: UserId,
        before: NaiveDate,
    ) -> Result<Vec<Expense>> {
        Self::fetch_expenses_before(&self.pool, user_id, before).await
    }

    async fn fetch_expenses_in_range<'e, E>(
        executor: E,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Expense>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date, sequence"
        ))
        .bind(user_id.to_string())
        .bind(start.format(DATE_FORMAT).to_string())
        .bind(end.format(DATE_FORMAT).to_string())
        .fetch_all(executor)
        .await
        .context("Failed to list expenses in range")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    /// A user's expenses with `start <= date <= end`, by date then sequence.
    pub async fn list_expenses_in_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Expense>> {
        Self::fetch_expenses_in_range(&self.pool, user_id, start, end).await
    }

    /// Read links, account names and the expenses around `window` in a single
    /// read transaction.
    pub async fn ledger_snapshot(
        &self,
        user_id: UserId,
        window: &MonthWindow,
    ) -> Result<LedgerSnapshot> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let links = Self::fetch_links(&mut *tx, user_id).await?;
        let account_names = Self::fetch_account_names(&mut *tx, user_id).await?;
        let prior = Self::fetch_expenses_before(&mut *tx, user_id, window.first_day).await?;
        let in_window =
            Self::fetch_expenses_in_range(&mut *tx, user_id, window.first_day, window.last_day)
                .await?;

        tx.commit().await.context("Failed to finish ledger read")?;

        Ok(LedgerSnapshot {
            links,
            account_names,
            prior,
            in_window,
        })
    }

    fn row_to_expense(row: &SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let account_id_str: String = row.get("account_id");
        let date_str: String = row.get("date");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            sequence: row.get("sequence"),
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            date: parse_date(&date_str)?,
            credit_cents: row.try_get("credit_cents").context("Invalid credit")?,
            debit_cents: row.try_get("debit_cents").context("Invalid debit")?,
            category: row.get("category"),
            notes: row.get("notes"),
            recorded_at: parse_timestamp(&recorded_at_str)?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("Invalid date: {s}"))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {s}"))?
        .with_timezone(&Utc))
}
