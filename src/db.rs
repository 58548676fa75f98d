//! Database schema setup and helpers for reading columns that SQLite has no native type for.

use std::str::FromStr;

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, types::Type};
use rust_decimal::Decimal;

use crate::{
    account::create_account_table, transaction::create_transaction_table, user::create_user_table,
};

/// Create all the tables and indexes used by the application.
///
/// Safe to call on an existing database, tables that already exist are left untouched.
///
/// # Errors
///
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read a decimal number stored as text in column `index`.
///
/// Money is stored as text so that no precision is lost on the way in or out of SQLite.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    get_parsed(row, index)
}

/// Read a text column and parse it with [FromStr], e.g. for enums stored by name.
pub(crate) fn get_parsed<T>(row: &Row, index: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(index)?;

    text.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// A stored enum value that does not match any variant.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown {kind} \"{value}\"")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
