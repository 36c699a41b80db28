use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{LedgerService, Session};
use crate::domain::{AccountId, AccountSummary, LedgerRow, MonthWindow};

/// Serialized form of one month's ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub user: String,
    pub month: MonthWindow,
    pub rows: Vec<LedgerRow>,
    pub summaries: BTreeMap<AccountId, AccountSummary>,
}

/// Exporter for writing monthly ledgers to CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Write the month's ledger rows as CSV. Returns the number of rows.
    pub async fn export_ledger_csv<W: Write>(
        &self,
        session: &Session,
        year: i32,
        month: u32,
        writer: W,
    ) -> Result<usize> {
        let ledger = self.service.monthly_ledger(session, year, month).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "sequence",
            "date",
            "account",
            "category",
            "credit_cents",
            "debit_cents",
            "balance_cents",
            "notes",
        ])?;

        for row in &ledger.rows {
            let expense = &row.expense;
            csv_writer.write_record([
                expense.id.to_string(),
                expense.sequence.to_string(),
                expense.date.format("%Y-%m-%d").to_string(),
                row.account_name.clone(),
                expense.category.clone(),
                expense.credit_cents.to_string(),
                expense.debit_cents.to_string(),
                row.balance_cents.to_string(),
                expense.notes.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(ledger.rows.len())
    }

    /// Write per-account start/end balances for the month as CSV.
    pub async fn export_summaries_csv<W: Write>(
        &self,
        session: &Session,
        year: i32,
        month: u32,
        writer: W,
    ) -> Result<usize> {
        let summaries = self.service.account_summaries(session, year, month).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "account_id",
            "account",
            "balance_at_month_start",
            "total_credit",
            "total_debit",
            "balance_at_month_end",
        ])?;

        for summary in summaries.values() {
            csv_writer.write_record([
                summary.account_id.to_string(),
                summary.name.clone(),
                summary.balance_at_month_start.to_string(),
                summary.total_credit.to_string(),
                summary.total_debit.to_string(),
                summary.balance_at_month_end.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(summaries.len())
    }

    /// Write the month's rows and summaries as a JSON document.
    pub async fn export_ledger_json<W: Write>(
        &self,
        session: &Session,
        year: i32,
        month: u32,
        mut writer: W,
    ) -> Result<LedgerExport> {
        let ledger = self.service.monthly_ledger(session, year, month).await?;

        let export = LedgerExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            user: session.email().to_string(),
            month: ledger.window,
            rows: ledger.rows,
            summaries: ledger.summaries,
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(export)
    }
}
