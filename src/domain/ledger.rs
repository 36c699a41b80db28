use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{AccountId, AccountLink, Cents, Expense, MonthWindow};

/// An expense annotated with its account's balance right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub expense: Expense,
    pub account_name: String,
    pub balance_cents: Cents,
}

/// Per-account totals for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: AccountId,
    pub name: String,
    pub balance_at_month_start: Cents,
    pub balance_at_month_end: Cents,
    pub total_credit: Cents,
    pub total_debit: Cents,
}

impl AccountSummary {
    pub fn net_change(&self) -> Cents {
        self.total_credit.saturating_sub(self.total_debit)
    }
}

/// The running-balance view of a single month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyLedger {
    pub window: MonthWindow,
    /// Chronological; same-day expenses keep insertion order
    pub rows: Vec<LedgerRow>,
    pub summaries: BTreeMap<AccountId, AccountSummary>,
}

/// Fold a user's expense history into the ledger for `window`.
///
/// Every account starts at its link's initial balance. Expenses dated before
/// the window move the starting balance regardless of the link's
/// `date_of_initial_balance`; expenses inside the window become rows carrying
/// the post-transaction balance; later expenses are ignored. Expenses on an
/// account the user has no link for start from zero.
///
/// The result depends only on the contents of `expenses`, not on their order.
/// Sums saturate at the `Cents` bounds; validated amounts are capped at
/// `MAX_AMOUNT_CENTS` so a real history never gets there.
pub fn compute_monthly_ledger<'a>(
    window: MonthWindow,
    links: &[AccountLink],
    account_names: &HashMap<AccountId, String>,
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> MonthlyLedger {
    let mut running: HashMap<AccountId, Cents> = links
        .iter()
        .map(|link| (link.account_id, link.initial_balance_cents))
        .collect();

    let mut in_window: Vec<&Expense> = Vec::new();
    for expense in expenses {
        if expense.date < window.first_day {
            let balance = running.entry(expense.account_id).or_insert(0);
            *balance = balance.saturating_add(expense.net_cents());
        } else if window.contains(expense.date) {
            in_window.push(expense);
        }
    }

    in_window.sort_by_key(|expense| (expense.date, expense.sequence));

    let name_of = |account_id: &AccountId| {
        account_names
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| account_id.to_string())
    };

    let mut summaries: BTreeMap<AccountId, AccountSummary> = running
        .iter()
        .map(|(account_id, balance)| {
            (
                *account_id,
                AccountSummary {
                    account_id: *account_id,
                    name: name_of(account_id),
                    balance_at_month_start: *balance,
                    balance_at_month_end: *balance,
                    total_credit: 0,
                    total_debit: 0,
                },
            )
        })
        .collect();

    let mut rows = Vec::with_capacity(in_window.len());
    for expense in in_window {
        let summary = summaries
            .entry(expense.account_id)
            .or_insert_with(|| AccountSummary {
                account_id: expense.account_id,
                name: name_of(&expense.account_id),
                balance_at_month_start: 0,
                balance_at_month_end: 0,
                total_credit: 0,
                total_debit: 0,
            });

        summary.balance_at_month_end = summary
            .balance_at_month_end
            .saturating_add(expense.net_cents());
        summary.total_credit = summary.total_credit.saturating_add(expense.credit_cents);
        summary.total_debit = summary.total_debit.saturating_add(expense.debit_cents);

        rows.push(LedgerRow {
            expense: expense.clone(),
            account_name: summary.name.clone(),
            balance_cents: summary.balance_at_month_end,
        });
    }

    MonthlyLedger {
        window,
        rows,
        summaries,
    }
}

/// Balance a link should hold according to the expense log:
/// the initial balance plus every expense of the link's user on the link's
/// account dated on or after `date_of_initial_balance`.
pub fn derive_link_balance<'a>(
    link: &AccountLink,
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Cents {
    expenses
        .into_iter()
        .filter(|e| {
            e.user_id == link.user_id
                && e.account_id == link.account_id
                && e.date >= link.date_of_initial_balance
        })
        .fold(link.initial_balance_cents, |balance, e| {
            balance.saturating_add(e.net_cents())
        })
}

/// Comparison between a link's cached balance and the derived one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub account_id: AccountId,
    pub account_name: String,
    pub cached_cents: Cents,
    pub derived_cents: Cents,
}

impl BalanceCheck {
    pub fn is_consistent(&self) -> bool {
        self.cached_cents == self.derived_cents
    }

    pub fn drift_cents(&self) -> Cents {
        self.cached_cents.saturating_sub(self.derived_cents)
    }
}

pub fn check_link_balances(
    links: &[AccountLink],
    account_names: &HashMap<AccountId, String>,
    expenses: &[Expense],
) -> Vec<BalanceCheck> {
    links
        .iter()
        .map(|link| BalanceCheck {
            account_id: link.account_id,
            account_name: account_names
                .get(&link.account_id)
                .cloned()
                .unwrap_or_else(|| link.account_id.to_string()),
            cached_cents: link.current_balance_cents,
            derived_cents: derive_link_balance(link, expenses),
        })
        .collect()
}
