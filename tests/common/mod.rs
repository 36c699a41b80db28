// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use fintrack::application::{LedgerService, Session};
use fintrack::config::Config;
use fintrack::domain::{Account, AccountType, Cents, NewAccount, NewExpense};
use tempfile::TempDir;

/// Path of the database file inside a test's temporary directory
pub fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.db")
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    test_service_with(|config| config).await
}

/// Like [`test_service`], with a chance to adjust the configuration first
pub async fn test_service_with(
    configure: impl FnOnce(Config) -> Config,
) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = configure(Config::new(db_path(&temp_dir)));
    let service = LedgerService::init(&config).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a YYYY-MM-DD date
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Register a user and open a session for them
pub async fn sign_up(service: &LedgerService, name: &str, email: &str) -> Result<Session> {
    service.create_user(name.into(), email.into()).await?;
    Ok(service.open_session(email).await?)
}

/// Create an account without linking it
pub async fn create_account(
    service: &LedgerService,
    name: &str,
    initial_balance_cents: Cents,
    initial_balance_date: &str,
) -> Result<Account> {
    Ok(service
        .create_account(NewAccount {
            name: name.into(),
            account_type: AccountType::Debit,
            color: "#336699".into(),
            initial_balance_cents,
            initial_balance_date: parse_date(initial_balance_date),
        })
        .await?)
}

/// Create an account and link it to the session's user with the account's
/// own baseline
pub async fn linked_account(
    service: &LedgerService,
    session: &Session,
    name: &str,
    initial_balance_cents: Cents,
    initial_balance_date: &str,
) -> Result<Account> {
    let account = create_account(service, name, initial_balance_cents, initial_balance_date).await?;
    service.link_account(session, account.id, None, None).await?;
    Ok(account)
}

/// Build an expense request
pub fn expense(
    account: &Account,
    date: &str,
    credit_cents: Cents,
    debit_cents: Cents,
    category: &str,
) -> NewExpense {
    NewExpense {
        account_id: account.id,
        date: parse_date(date),
        credit_cents,
        debit_cents,
        category: category.into(),
        notes: None,
    }
}

/// The session user's cached balance for `account`
pub async fn current_balance(
    service: &LedgerService,
    session: &Session,
    account: &Account,
) -> Result<Cents> {
    let links = service.list_links(session).await?;
    let entry = links
        .into_iter()
        .find(|entry| entry.account.id == account.id)
        .ok_or_else(|| anyhow::anyhow!("account {} is not linked", account.name))?;
    Ok(entry.link.current_balance_cents)
}
