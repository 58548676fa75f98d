use std::str::FromStr;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{UnknownVariant, get_decimal, get_parsed},
    user::UserId,
};

pub type AccountId = i64;

/// The kind of bank account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Current,
    Savings,
}

impl AccountType {
    pub const ALL: [Self; 2] = [Self::Current, Self::Savings];

    /// The value stored in the database and sent in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Savings => "SAVINGS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::Savings => "Savings",
        }
    }
}

impl FromStr for AccountType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CURRENT" => Ok(Self::Current),
            "SAVINGS" => Ok(Self::Savings),
            _ => Err(UnknownVariant {
                kind: "account type",
                value: value.to_owned(),
            }),
        }
    }
}

/// A place where a user keeps money, e.g. an everyday or savings account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name, never empty.
    pub name: String,
    pub account_type: AccountType,
    /// The current balance, updated whenever a transaction is recorded against the account.
    pub balance: Decimal,
    /// Whether this is the user's default account.
    ///
    /// A user has at most one default account.
    pub is_default: bool,
    pub created_at: OffsetDateTime,
}

/// An account with the number of transactions recorded against it.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub account: Account,
    pub transaction_count: i64,
}

/// Create the account table and its indexes.
///
/// The partial unique index on `user_id` guarantees that storage never holds two
/// default accounts for one user, even if a write bypasses [crate::account::create_account].
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            balance TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_account_default
            ON account(user_id) WHERE is_default = 1;
        CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id);",
    )?;

    Ok(())
}

/// Map a row with the columns `id, user_id, name, account_type, balance, is_default, created_at`.
pub fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        account_type: get_parsed(row, 3)?,
        balance: get_decimal(row, 4)?,
        is_default: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_account_summary_row(row: &Row) -> Result<AccountSummary, rusqlite::Error> {
    Ok(AccountSummary {
        account: map_account_row(row)?,
        transaction_count: row.get(7)?,
    })
}

/// Get the account with `account_id` owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to someone else,
/// or [Error::SqlError] if there was some other SQL error.
pub fn get_account(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, account_type, balance, is_default, created_at
            FROM account WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &account_id), (":user_id", &user_id.as_i64())],
            map_account_row,
        )
        .map_err(|error| error.into())
}

/// Get all of a user's accounts, newest first, with their transaction counts.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an SQL error.
pub fn list_accounts(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<AccountSummary>, Error> {
    connection
        .prepare(
            "SELECT a.id, a.user_id, a.name, a.account_type, a.balance, a.is_default, a.created_at,
                (SELECT COUNT(t.id) FROM \"transaction\" t WHERE t.account_id = a.id)
            FROM account a
            WHERE a.user_id = :user_id
            ORDER BY a.created_at DESC, a.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_account_summary_row)?
        .map(|maybe_summary| maybe_summary.map_err(Error::from))
        .collect()
}

/// Get the number of accounts owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an SQL error.
pub fn count_accounts(user_id: UserId, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM account WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        Error,
        account::{AccountType, NewAccount, create_account, get_account, list_accounts},
        db::initialize,
        identity::Principal,
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::{UserId, ensure_user},
    };

    use super::create_account_table;

    fn get_test_connection() -> (Connection, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = ensure_user(&Principal::new("alice"), &connection).unwrap();

        (connection, user.id)
    }

    fn new_account(name: &str) -> NewAccount {
        NewAccount {
            name: name.to_owned(),
            balance: "10.00".to_owned(),
            account_type: AccountType::Current,
            is_default: false,
        }
    }

    #[test]
    fn create_table_is_valid_sql() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(Ok(()), create_account_table(&connection));
    }

    #[test]
    fn get_account_is_scoped_to_owner() {
        let (connection, alice) = get_test_connection();
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;
        let account = create_account(alice, &new_account("Everyday"), &connection).unwrap();

        assert_eq!(get_account(alice, account.id, &connection), Ok(account.clone()));
        assert_eq!(get_account(bob, account.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn list_accounts_is_newest_first_with_counts() {
        let (connection, user_id) = get_test_connection();
        let first = create_account(user_id, &new_account("First"), &connection).unwrap();
        let second = create_account(user_id, &new_account("Second"), &connection).unwrap();
        create_transaction(
            user_id,
            &NewTransaction {
                account_id: first.id,
                transaction_type: TransactionType::Expense,
                amount: "1.50".to_owned(),
                category: "food".to_owned(),
                description: None,
                date: time::macros::date!(2025 - 03 - 01),
                is_recurring: false,
                recurring_interval: None,
            },
            &connection,
        )
        .unwrap();

        let accounts = list_accounts(user_id, &connection).unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].account.id, second.id);
        assert_eq!(accounts[0].transaction_count, 0);
        assert_eq!(accounts[1].account.id, first.id);
        assert_eq!(accounts[1].transaction_count, 1);
        assert_eq!(accounts[1].account.balance, Decimal::new(850, 2));
    }

    #[test]
    fn list_accounts_excludes_other_users() {
        let (connection, alice) = get_test_connection();
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;
        create_account(alice, &new_account("Alice's"), &connection).unwrap();

        assert_eq!(list_accounts(bob, &connection), Ok(vec![]));
    }
}
