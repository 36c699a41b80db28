use std::collections::HashMap;
use std::fs::File;
use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use uuid::Uuid;

use crate::application::{ApiResponse, AppError, LedgerService, Session};
use crate::config::{Config, DEFAULT_MAX_CONNECTIONS};
use crate::domain::{
    AccountForm, ExpenseEdit, ExpenseForm, FutureDatePolicy, MonthWindow, MonthlyLedger,
    format_cents,
    parse_cents,
};
use crate::io::Exporter;

/// Fintrack - Personal Finance Tracker
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Track expenses against linked accounts and review monthly running balances")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "FINTRACK_DB", default_value = "fintrack.db", global = true)]
    pub database: PathBuf,

    /// Email of the user to act as
    #[arg(short, long, env = "FINTRACK_USER", global = true)]
    pub user: Option<String>,

    /// Whether expenses may be dated after today
    #[arg(long, value_enum, env = "FINTRACK_FUTURE_DATES", default_value_t = FutureDates::Reject, global = true)]
    pub future_dates: FutureDates,

    /// Maximum number of pooled database connections
    #[arg(long, env = "FINTRACK_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS, global = true)]
    pub max_connections: u32,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Print results as `{ error, data, message }` JSON envelopes
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FutureDates {
    Reject,
    Allow,
}

impl From<FutureDates> for FutureDatePolicy {
    fn from(value: FutureDates) -> Self {
        match value {
            FutureDates::Reject => FutureDatePolicy::Reject,
            FutureDates::Allow => FutureDatePolicy::Allow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Expense commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Show a month's expenses with running account balances
    Ledger {
        /// Defaults to the current year
        year: Option<i32>,
        /// Defaults to the current month
        month: Option<u32>,
    },

    /// Show start and end balances per account for a month
    Summary {
        year: Option<i32>,
        month: Option<u32>,
    },

    /// Compare cached account balances with the expense log
    Check,

    /// Export a month's ledger to CSV or JSON
    Export {
        year: i32,
        month: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Export per-account summaries instead of rows (CSV only)
        #[arg(long)]
        summaries: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Create {
        name: String,
        email: String,
    },

    /// Show the current user
    Show,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,

        /// Account type: credit or debit
        #[arg(short = 't', long = "type")]
        account_type: String,

        /// Display color as #RRGGBB
        #[arg(short, long, default_value = "#4a90d9")]
        color: String,

        /// Opening balance (e.g., "1500.00")
        #[arg(short, long, default_value = "0")]
        initial_balance: String,

        /// Date of the opening balance (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List all accounts
    List,

    /// Link an account to the current user
    Link {
        /// Account name or ID
        account: String,

        /// Opening balance for this user (defaults to the account's)
        #[arg(short, long)]
        initial_balance: Option<String>,

        /// Date of that opening balance (defaults to the account's)
        #[arg(long)]
        date: Option<String>,
    },

    /// List the current user's linked accounts and balances
    Linked,
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Account name or ID
        #[arg(short, long)]
        account: String,

        /// Category (e.g., "groceries")
        #[arg(short, long)]
        category: String,

        /// Amount added to the account
        #[arg(long, default_value = "0")]
        credit: String,

        /// Amount taken from the account
        #[arg(long, default_value = "0")]
        debit: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all of the current user's expenses
    List,

    /// Show one expense
    Show {
        id: String,
    },

    /// Change fields of an expense
    Edit {
        id: String,

        #[arg(long)]
        date: Option<String>,

        /// Move the expense to another linked account (name or ID)
        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        credit: Option<String>,

        #[arg(long)]
        debit: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        /// Remove the expense's notes
        #[arg(long)]
        clear_notes: bool,
    },

    /// Delete an expense and revert its balance change
    Delete {
        id: String,
    },
}

/// Prints either human-readable output or the JSON envelope.
struct Printer {
    json: bool,
}

impl Printer {
    fn emit<T: Serialize>(
        &self,
        result: Result<T, AppError>,
        created: bool,
        message: &str,
        render: impl FnOnce(&T),
    ) -> Result<()> {
        if !self.json {
            render(&result?);
            return Ok(());
        }

        match result {
            Ok(data) => {
                let response = if created {
                    ApiResponse::created(data, message)
                } else {
                    ApiResponse::ok(data, message)
                };
                println!("{}", response.to_json()?);
                Ok(())
            }
            Err(error) => {
                println!("{}", ApiResponse::<T>::failure(&error).to_json()?);
                Err(error.into())
            }
        }
    }
}

impl Cli {
    /// Filter directive for the log subscriber.
    pub fn log_directive(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }

    pub fn config(&self) -> Config {
        Config::new(&self.database)
            .with_future_dates(self.future_dates.into())
            .with_max_connections(self.max_connections)
    }

    async fn session(&self, service: &LedgerService) -> Result<Session, AppError> {
        let email = self.user.as_deref().ok_or_else(|| {
            AppError::Unauthorized("no user selected, pass --user or set FINTRACK_USER".into())
        })?;
        service.open_session(email).await
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();
        let printer = Printer { json: self.json };

        if let Commands::Init = self.command {
            let result = LedgerService::init(&config)
                .await
                .map(|_| config.database.display().to_string());
            return printer.emit(result, true, "Database initialized", |path| {
                println!("Database initialized: {path}")
            });
        }

        let service = LedgerService::connect(&config).await?;

        match &self.command {
            Commands::Init => {}

            Commands::User(cmd) => run_user_command(&self, &service, &printer, cmd).await?,

            Commands::Account(cmd) => run_account_command(&self, &service, &printer, cmd).await?,

            Commands::Expense(cmd) => run_expense_command(&self, &service, &printer, cmd).await?,

            Commands::Ledger { year, month } => {
                let (year, month) = month_or_current(*year, *month);
                let result = match self.session(&service).await {
                    Ok(session) => service.monthly_ledger(&session, year, month).await,
                    Err(e) => Err(e),
                };
                printer.emit(result, false, "Ledger computed", print_ledger)?;
            }

            Commands::Summary { year, month } => {
                let (year, month) = month_or_current(*year, *month);
                let result = match self.session(&service).await {
                    Ok(session) => service.monthly_ledger(&session, year, month).await,
                    Err(e) => Err(e),
                };
                printer.emit(result, false, "Summary computed", print_summaries)?;
            }

            Commands::Check => {
                let result = match self.session(&service).await {
                    Ok(session) => service.check_balances(&session).await,
                    Err(e) => Err(e),
                };
                printer.emit(result, false, "Balances checked", |checks| {
                    if checks.is_empty() {
                        println!("No linked accounts.");
                        return;
                    }
                    println!(
                        "{:<20} {:>12} {:>12} {:>10}",
                        "ACCOUNT", "CACHED", "DERIVED", "STATUS"
                    );
                    println!("{}", "-".repeat(57));
                    for check in checks {
                        println!(
                            "{:<20} {:>12} {:>12} {:>10}",
                            truncate(&check.account_name, 20),
                            format_cents(check.cached_cents),
                            format_cents(check.derived_cents),
                            if check.is_consistent() { "OK" } else { "DRIFT" }
                        );
                    }
                })?;
            }

            Commands::Export {
                year,
                month,
                format,
                summaries,
                output,
            } => {
                let session = self.session(&service).await?;
                run_export_command(
                    &service,
                    &session,
                    *year,
                    *month,
                    *format,
                    *summaries,
                    output.as_ref(),
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(
    cli: &Cli,
    service: &LedgerService,
    printer: &Printer,
    cmd: &UserCommands,
) -> Result<()> {
    match cmd {
        UserCommands::Create { name, email } => {
            let result = service.create_user(name.clone(), email.clone()).await;
            printer.emit(result, true, "User created successfully", |user| {
                println!("Created user: {} <{}>", user.name, user.email)
            })?;
        }

        UserCommands::Show => {
            let result = match cli.session(service).await {
                Ok(session) => service.get_user(&session).await,
                Err(e) => Err(e),
            };
            printer.emit(result, false, "User retrieved", |user| {
                println!("User: {}", user.name);
                println!("  ID:      {}", user.id);
                println!("  Email:   {}", user.email);
                println!("  Created: {}", user.created_at.format("%Y-%m-%d %H:%M:%S"));
            })?;
        }
    }
    Ok(())
}

async fn run_account_command(
    cli: &Cli,
    service: &LedgerService,
    printer: &Printer,
    cmd: &AccountCommands,
) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            account_type,
            color,
            initial_balance,
            date,
        } => {
            let form = AccountForm {
                name: name.clone(),
                account_type: account_type.clone(),
                color: color.clone(),
                initial_balance: initial_balance.clone(),
                initial_balance_date: date.clone().unwrap_or_else(today_string),
            };
            let result = match form.parse() {
                Ok(new_account) => service.create_account(new_account).await,
                Err(errors) => Err(AppError::Validation(errors)),
            };
            printer.emit(result, true, "Account created successfully", |account| {
                println!(
                    "Created account: {} ({}, opening {} on {})",
                    account.name,
                    account.account_type,
                    format_cents(account.initial_balance_cents),
                    account.initial_balance_date
                )
            })?;
        }

        AccountCommands::List => {
            let result = service.list_accounts().await;
            printer.emit(result, false, "Accounts retrieved", |accounts| {
                if accounts.is_empty() {
                    println!("No accounts found.");
                    return;
                }
                println!("{:<20} {:<8} {:<8} {:>12}", "NAME", "TYPE", "COLOR", "OPENING");
                println!("{}", "-".repeat(51));
                for account in accounts {
                    println!(
                        "{:<20} {:<8} {:<8} {:>12}",
                        truncate(&account.name, 20),
                        account.account_type,
                        account.color,
                        format_cents(account.initial_balance_cents)
                    );
                }
            })?;
        }

        AccountCommands::Link {
            account,
            initial_balance,
            date,
        } => {
            let initial_balance_cents = initial_balance
                .as_deref()
                .map(parse_cents)
                .transpose()
                .context("Invalid amount format. Use '50.00' or '50'")?;
            let date = date.as_deref().map(parse_date).transpose()?;

            let result = async {
                let session = cli.session(service).await?;
                let account = service.find_account(account).await?;
                let link = service
                    .link_account(&session, account.id, initial_balance_cents, date)
                    .await?;
                Ok::<_, AppError>((account.name, link))
            }
            .await;
            printer.emit(result, true, "Account linked successfully", |(name, link)| {
                println!(
                    "Linked account: {} (balance {} as of {})",
                    name,
                    format_cents(link.current_balance_cents),
                    link.date_of_initial_balance
                )
            })?;
        }

        AccountCommands::Linked => {
            let result = match cli.session(service).await {
                Ok(session) => service.list_links(&session).await,
                Err(e) => Err(e),
            };
            printer.emit(result, false, "Linked accounts retrieved", |linked| {
                if linked.is_empty() {
                    println!("No linked accounts.");
                    return;
                }
                println!("{:<20} {:<8} {:>12} {:<12}", "ACCOUNT", "TYPE", "BALANCE", "SINCE");
                println!("{}", "-".repeat(55));
                for entry in linked {
                    println!(
                        "{:<20} {:<8} {:>12} {:<12}",
                        truncate(&entry.account.name, 20),
                        entry.account.account_type,
                        format_cents(entry.link.current_balance_cents),
                        entry.link.date_of_initial_balance
                    );
                }
            })?;
        }
    }
    Ok(())
}

async fn run_expense_command(
    cli: &Cli,
    service: &LedgerService,
    printer: &Printer,
    cmd: &ExpenseCommands,
) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            account,
            category,
            credit,
            debit,
            date,
            notes,
        } => {
            let result = async {
                let session = cli.session(service).await?;
                let form = ExpenseForm {
                    date: date.clone().unwrap_or_else(today_string),
                    account_id: resolve_account(service, account).await?,
                    credit: credit.clone(),
                    debit: debit.clone(),
                    category: category.clone(),
                    notes: notes.clone(),
                };
                service.submit_expense(&session, &form).await
            }
            .await;
            printer.emit(result, true, "Expense created successfully", |expense| {
                println!(
                    "Recorded expense: {} {} on {} ({})",
                    format_cents(expense.net_cents()),
                    expense.category,
                    expense.date,
                    expense.id
                )
            })?;
        }

        ExpenseCommands::List => {
            let result = async {
                let session = cli.session(service).await?;
                let expenses = service.list_expenses(&session).await?;
                let names = service
                    .list_accounts()
                    .await?
                    .into_iter()
                    .map(|a| (a.id, a.name))
                    .collect::<HashMap<_, _>>();
                Ok::<_, AppError>((expenses, names))
            }
            .await
            .map(|(expenses, names)| {
                expenses
                    .into_iter()
                    .map(|e| {
                        let name = names.get(&e.account_id).cloned().unwrap_or_default();
                        (e, name)
                    })
                    .collect::<Vec<_>>()
            });
            printer.emit(result, false, "Expenses retrieved", |expenses| {
                if expenses.is_empty() {
                    println!("No expenses found.");
                    return;
                }
                println!(
                    "{:<12} {:<15} {:<15} {:>10} {:>10}",
                    "DATE", "ACCOUNT", "CATEGORY", "CREDIT", "DEBIT"
                );
                println!("{}", "-".repeat(66));
                for (expense, account) in expenses {
                    println!(
                        "{:<12} {:<15} {:<15} {:>10} {:>10}",
                        expense.date,
                        truncate(account, 15),
                        truncate(&expense.category, 15),
                        format_cents(expense.credit_cents),
                        format_cents(expense.debit_cents)
                    );
                }
            })?;
        }

        ExpenseCommands::Show { id } => {
            let result = async {
                let session = cli.session(service).await?;
                service.get_expense(&session, parse_expense_id(id)?).await
            }
            .await;
            printer.emit(result, false, "Expense retrieved", |expense| {
                println!("Expense: {}", expense.id);
                println!("  Sequence:    {}", expense.sequence);
                println!("  Date:        {}", expense.date);
                println!("  Account:     {}", expense.account_id);
                println!("  Category:    {}", expense.category);
                println!("  Credit:      {}", format_cents(expense.credit_cents));
                println!("  Debit:       {}", format_cents(expense.debit_cents));
                if let Some(notes) = &expense.notes {
                    println!("  Notes:       {notes}");
                }
                println!(
                    "  Recorded at: {}",
                    expense.recorded_at.format("%Y-%m-%d %H:%M:%S")
                );
            })?;
        }

        ExpenseCommands::Edit {
            id,
            date,
            account,
            credit,
            debit,
            category,
            notes,
            clear_notes,
        } => {
            let result = async {
                let session = cli.session(service).await?;
                let mut edits = Vec::new();
                if let Some(date) = date {
                    edits.push(ExpenseEdit::Date(date.clone()));
                }
                if let Some(account) = account {
                    edits.push(ExpenseEdit::Account(resolve_account(service, account).await?));
                }
                if let Some(credit) = credit {
                    edits.push(ExpenseEdit::Credit(credit.clone()));
                }
                if let Some(debit) = debit {
                    edits.push(ExpenseEdit::Debit(debit.clone()));
                }
                if let Some(category) = category {
                    edits.push(ExpenseEdit::Category(category.clone()));
                }
                if let Some(notes) = notes {
                    edits.push(ExpenseEdit::Notes(Some(notes.clone())));
                } else if *clear_notes {
                    edits.push(ExpenseEdit::Notes(None));
                }
                service
                    .update_expense(&session, parse_expense_id(id)?, edits)
                    .await
            }
            .await;
            printer.emit(result, false, "Expense updated successfully", |expense| {
                println!(
                    "Updated expense: {} {} on {} ({})",
                    format_cents(expense.net_cents()),
                    expense.category,
                    expense.date,
                    expense.id
                )
            })?;
        }

        ExpenseCommands::Delete { id } => {
            let result = async {
                let session = cli.session(service).await?;
                service.delete_expense(&session, parse_expense_id(id)?).await
            }
            .await;
            printer.emit(result, false, "Expense deleted successfully", |expense| {
                println!(
                    "Deleted expense: {} {} on {}",
                    format_cents(expense.net_cents()),
                    expense.category,
                    expense.date
                )
            })?;
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    session: &Session,
    year: i32,
    month: u32,
    format: ExportFormat,
    summaries: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match (format, summaries) {
        (ExportFormat::Csv, false) => {
            let count = exporter
                .export_ledger_csv(session, year, month, writer)
                .await?;
            if output.is_some() {
                eprintln!("Exported {count} ledger rows");
            }
        }
        (ExportFormat::Csv, true) => {
            let count = exporter
                .export_summaries_csv(session, year, month, writer)
                .await?;
            if output.is_some() {
                eprintln!("Exported {count} account summaries");
            }
        }
        (ExportFormat::Json, _) => {
            let export = exporter
                .export_ledger_json(session, year, month, writer)
                .await?;
            if output.is_some() {
                eprintln!(
                    "Exported {}: {} rows, {} accounts",
                    export.month,
                    export.rows.len(),
                    export.summaries.len()
                );
            }
        }
    }

    Ok(())
}

fn print_ledger(ledger: &MonthlyLedger) {
    println!("Ledger for {}\n", ledger.window);
    if ledger.rows.is_empty() {
        println!("No expenses this month.");
    } else {
        println!(
            "{:<12} {:<15} {:<15} {:>10} {:>10} {:>12}",
            "DATE", "ACCOUNT", "CATEGORY", "CREDIT", "DEBIT", "BALANCE"
        );
        println!("{}", "-".repeat(79));
        for row in &ledger.rows {
            println!(
                "{:<12} {:<15} {:<15} {:>10} {:>10} {:>12}",
                row.expense.date,
                truncate(&row.account_name, 15),
                truncate(&row.expense.category, 15),
                format_cents(row.expense.credit_cents),
                format_cents(row.expense.debit_cents),
                format_cents(row.balance_cents)
            );
        }
    }
    println!();
    print_summaries(ledger);
}

fn print_summaries(ledger: &MonthlyLedger) {
    if ledger.summaries.is_empty() {
        println!("No linked accounts.");
        return;
    }
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>12}",
        "ACCOUNT", "START", "CREDIT", "DEBIT", "END"
    );
    println!("{}", "-".repeat(72));
    for summary in ledger.summaries.values() {
        println!(
            "{:<20} {:>12} {:>12} {:>12} {:>12}",
            truncate(&summary.name, 20),
            format_cents(summary.balance_at_month_start),
            format_cents(summary.total_credit),
            format_cents(summary.total_debit),
            format_cents(summary.balance_at_month_end)
        );
    }
}

/// Accept an account ID or name and hand back the ID as form input.
async fn resolve_account(service: &LedgerService, account: &str) -> Result<String, AppError> {
    if Uuid::parse_str(account.trim()).is_ok() {
        return Ok(account.trim().to_string());
    }
    Ok(service.find_account(account).await?.id.to_string())
}

/// Fill in a missing year or month from today's date.
fn month_or_current(year: Option<i32>, month: Option<u32>) -> (i32, u32) {
    let current = MonthWindow::containing(Utc::now().date_naive());
    (year.unwrap_or(current.year), month.unwrap_or(current.month))
}

fn parse_expense_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::ExpenseNotFound(id.to_string()))
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}

fn today_string() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn test_global_options_and_defaults() {
        let cli = Cli::try_parse_from([
            "fintrack",
            "--user",
            "ana@example.com",
            "ledger",
            "2024",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("ana@example.com"));
        assert_eq!(cli.future_dates, FutureDates::Reject);
        assert_eq!(cli.log_directive(), "warn");
        assert!(matches!(
            cli.command,
            Commands::Ledger {
                year: Some(2024),
                month: Some(3)
            }
        ));
    }

    #[test]
    fn test_verbose_raises_log_level() {
        let cli = Cli::try_parse_from(["fintrack", "check", "--verbose"]).unwrap();
        assert_eq!(cli.log_directive(), "debug");
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::try_parse_from([
            "fintrack",
            "--database",
            "/tmp/money.db",
            "--future-dates",
            "allow",
            "--max-connections",
            "2",
            "check",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.database, PathBuf::from("/tmp/money.db"));
        assert_eq!(config.future_dates, FutureDatePolicy::Allow);
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn test_edit_notes_flags_conflict() {
        let result = Cli::try_parse_from([
            "fintrack",
            "expense",
            "edit",
            "some-id",
            "--notes",
            "x",
            "--clear-notes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_month_or_current() {
        assert_eq!(month_or_current(Some(2023), Some(7)), (2023, 7));

        let today = Utc::now().date_naive();
        let (year, month) = month_or_current(None, None);
        assert_eq!(year, today.year());
        assert_eq!(month, today.month());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Checking", 20), "Checking");
        assert_eq!(truncate("A very long account name", 10), "A very ...");
    }
}
