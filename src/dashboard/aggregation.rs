//! Totals shown in the dashboard summary cards.

use rust_decimal::Decimal;
use time::Date;

use crate::{
    account::AccountSummary,
    transaction::{Transaction, TransactionType},
};

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct MonthTotals {
    /// Total income, zero or positive.
    pub income: Decimal,
    /// Total expenses as a positive amount.
    pub expenses: Decimal,
}

impl MonthTotals {
    /// Income minus expenses.
    pub fn net(&self) -> Decimal {
        self.income - self.expenses
    }
}

/// Sum the transactions that fall in the same month and year as `today`.
pub(super) fn month_totals(transactions: &[Transaction], today: Date) -> MonthTotals {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.date.year() == today.year() && transaction.date.month() == today.month()
        })
        .fold(MonthTotals::default(), |mut totals, transaction| {
            match transaction.transaction_type {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => totals.expenses += transaction.amount,
            }
            totals
        })
}

/// The sum of all account balances.
pub(super) fn total_balance(accounts: &[AccountSummary]) -> Decimal {
    accounts.iter().map(|summary| summary.account.balance).sum()
}
