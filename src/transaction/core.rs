//! Defines the core data models and database queries for transactions.

use std::str::FromStr;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, util::is_leap_year};

use crate::{
    Error,
    account::AccountId,
    db::{UnknownVariant, get_decimal, get_parsed},
    user::UserId,
};

pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub const ALL: [Self; 2] = [Self::Income, Self::Expense];

    /// The value stored in the database and sent in forms and query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(UnknownVariant {
                kind: "transaction type",
                value: value.to_owned(),
            }),
        }
    }
}

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl RecurringInterval {
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }
}

impl FromStr for RecurringInterval {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(UnknownVariant {
                kind: "recurring interval",
                value: value.to_owned(),
            }),
        }
    }
}

/// The schedule of a recurring transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub interval: RecurringInterval,
    /// When the transaction is next due.
    pub next_date: Date,
}

impl Recurrence {
    /// The schedule for a transaction on `date` that repeats every `interval`.
    pub fn starting_from(date: Date, interval: RecurringInterval) -> Self {
        Self {
            interval,
            next_date: next_recurring_date(date, interval),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    /// The amount of money, always positive. The direction comes from `transaction_type`.
    pub amount: Decimal,
    /// A key into [crate::category::CATEGORIES].
    pub category: String,
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: Date,
    /// Set only for recurring transactions.
    pub recurrence: Option<Recurrence>,
    pub created_at: OffsetDateTime,
}

impl Transaction {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> Decimal {
        signed_amount(self.transaction_type, self.amount)
    }
}

/// `amount` with the sign given by `transaction_type`.
pub fn signed_amount(transaction_type: TransactionType, amount: Decimal) -> Decimal {
    match transaction_type {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    }
}

// ============================================================================
// DATES
// ============================================================================

/// The date a recurring transaction on `date` is next due.
///
/// Monthly and yearly intervals keep the day of the month where possible and
/// otherwise use the last day of the month, e.g. 31 January is followed by
/// 28 February and 29 February 2024 is followed by 28 February 2025.
pub fn next_recurring_date(date: Date, interval: RecurringInterval) -> Date {
    match interval {
        RecurringInterval::Daily => date.saturating_add(Duration::days(1)),
        RecurringInterval::Weekly => date.saturating_add(Duration::weeks(1)),
        RecurringInterval::Monthly => {
            let year = if date.month() == Month::December {
                date.year() + 1
            } else {
                date.year()
            };
            same_day_in_month(date, year, date.month().next())
        }
        RecurringInterval::Yearly => same_day_in_month(date, date.year() + 1, date.month()),
    }
}

fn same_day_in_month(date: Date, year: i32, month: Month) -> Date {
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).unwrap_or(Date::MAX)
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table and its indexes.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            transaction_type TEXT NOT NULL,
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            recurring_interval TEXT,
            next_recurring_date TEXT,
            created_at TEXT NOT NULL,
            CHECK ((recurring_interval IS NULL) = (next_recurring_date IS NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_account ON \"transaction\"(account_id);",
    )?;

    Ok(())
}

/// The columns expected by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, transaction_type, amount, \
    category, description, date, recurring_interval, next_recurring_date, created_at";

/// Map a database row to a transaction, see [TRANSACTION_COLUMNS] for the column order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let interval: Option<String> = row.get(8)?;
    let next_date: Option<Date> = row.get(9)?;

    let recurrence = match (interval, next_date) {
        (Some(interval), Some(next_date)) => Some(Recurrence {
            interval: interval.parse().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(error),
                )
            })?,
            next_date,
        }),
        _ => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        account_id: row.get(2)?,
        transaction_type: get_parsed(row, 3)?,
        amount: get_decimal(row, 4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        recurrence,
        created_at: row.get(10)?,
    })
}

/// Retrieve a transaction owned by `user_id` by its `id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Get all of a user's transactions, newest first.
///
/// Transactions on the same date are ordered by ID, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an SQL error.
pub fn list_dashboard_transactions(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE user_id = :user_id
            ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the transactions recorded against one of the user's accounts, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an SQL error.
pub fn list_account_transactions(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE user_id = :user_id AND account_id = :account_id
            ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":account_id", &account_id)],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Add `delta` to the balance of `account_id`.
///
/// Callers run this inside the same SQL transaction as the write that caused it.
pub(crate) fn adjust_account_balance(
    account_id: AccountId,
    delta: Decimal,
    connection: &Connection,
) -> Result<(), Error> {
    let balance = connection.query_row(
        "SELECT balance FROM account WHERE id = ?1",
        [account_id],
        |row| get_decimal(row, 0),
    )?;

    connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        ((balance + delta).to_string(), account_id),
    )?;

    Ok(())
}

/// Get the number of transactions in the database.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| row.get(0))
        .map_err(|error| error.into())
}


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountId, AccountType, NewAccount, create_account},
        db::initialize,
        identity::Principal,
        transaction::{
            NewTransaction, RecurringInterval, TransactionType, create_transaction,
            get_transaction, list_account_transactions, list_dashboard_transactions,
        },
        user::{UserId, ensure_user},
    };

    use super::create_transaction_table;

    fn get_test_connection() -> (Connection, UserId, AccountId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = ensure_user(&Principal::new("alice"), &connection).unwrap().id;
        let account = create_account(
            user_id,
            &NewAccount {
                name: "Everyday".to_owned(),
                balance: "0".to_owned(),
                account_type: AccountType::Current,
                is_default: true,
            },
            &connection,
        )
        .unwrap();

        (connection, user_id, account.id)
    }

    fn expense(account_id: AccountId, date: time::Date) -> NewTransaction {
        NewTransaction {
            account_id,
            transaction_type: TransactionType::Expense,
            amount: "4.50".to_owned(),
            category: "food".to_owned(),
            description: Some("Coffee".to_owned()),
            date,
            is_recurring: false,
            recurring_interval: None,
        }
    }

    #[test]
    fn create_table_is_valid_sql() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(Ok(()), create_transaction_table(&connection));
    }

    #[test]
    fn get_transaction_round_trips_recurrence() {
        let (connection, user_id, account_id) = get_test_connection();
        let mut new_transaction = expense(account_id, date!(2025 - 01 - 31));
        new_transaction.is_recurring = true;
        new_transaction.recurring_interval = Some(RecurringInterval::Monthly);
        let created = create_transaction(user_id, &new_transaction, &connection).unwrap();

        let fetched = get_transaction(user_id, created.id, &connection).unwrap();

        assert_eq!(fetched, created);
        let recurrence = fetched.recurrence.expect("want recurrence");
        assert_eq!(recurrence.interval, RecurringInterval::Monthly);
        assert_eq!(recurrence.next_date, date!(2025 - 02 - 28));
    }

    #[test]
    fn get_transaction_is_scoped_to_owner() {
        let (connection, user_id, account_id) = get_test_connection();
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;
        let created =
            create_transaction(user_id, &expense(account_id, date!(2025 - 01 - 01)), &connection)
                .unwrap();

        assert_eq!(get_transaction(bob, created.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn dashboard_transactions_are_newest_first() {
        let (connection, user_id, account_id) = get_test_connection();
        let older =
            create_transaction(user_id, &expense(account_id, date!(2025 - 01 - 01)), &connection)
                .unwrap();
        let newer =
            create_transaction(user_id, &expense(account_id, date!(2025 - 02 - 01)), &connection)
                .unwrap();
        let same_day =
            create_transaction(user_id, &expense(account_id, date!(2025 - 02 - 01)), &connection)
                .unwrap();

        let ids: Vec<_> = list_dashboard_transactions(user_id, &connection)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect();

        assert_eq!(ids, vec![same_day.id, newer.id, older.id]);
    }

    #[test]
    fn account_transactions_only_include_that_account() {
        let (connection, user_id, account_id) = get_test_connection();
        let other_account = create_account(
            user_id,
            &NewAccount {
                name: "Savings".to_owned(),
                balance: "0".to_owned(),
                account_type: AccountType::Savings,
                is_default: false,
            },
            &connection,
        )
        .unwrap();
        let wanted =
            create_transaction(user_id, &expense(account_id, date!(2025 - 01 - 01)), &connection)
                .unwrap();
        create_transaction(
            user_id,
            &expense(other_account.id, date!(2025 - 01 - 01)),
            &connection,
        )
        .unwrap();

        let transactions = list_account_transactions(user_id, account_id, &connection).unwrap();

        assert_eq!(transactions, vec![wanted]);
    }
}
