//! Code for creating the user table and provisioning users from authenticated identities.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, identity::Principal};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Users are never created explicitly: the first authenticated request for
/// an identity creates the matching row, see [ensure_user].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The subject ID issued by the identity provider.
    pub identity_id: String,
    /// When the user was first seen.
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                identity_id TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        identity_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Fetch the user for `principal`, creating it first if this identity has never been seen.
///
/// The insert is a no-op when the identity already exists, so concurrent
/// calls for the same identity resolve to the same row instead of failing
/// on the unique constraint.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn ensure_user(principal: &Principal, connection: &Connection) -> Result<User, Error> {
    let inserted = connection.execute(
        "INSERT INTO user (identity_id, created_at) VALUES (?1, ?2)
        ON CONFLICT(identity_id) DO NOTHING",
        (principal.as_str(), OffsetDateTime::now_utc()),
    )?;

    if inserted > 0 {
        tracing::info!("Provisioned a new user for identity {principal}");
    }

    get_user_by_identity(principal, connection)
}

/// Get the user whose identity provider subject ID is `principal`.
///
/// # Errors
///
/// This function will return an error if:
/// - no user has been provisioned for `principal` ([Error::NotFound]),
/// - there was an error trying to access the database.
pub fn get_user_by_identity(principal: &Principal, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, identity_id, created_at FROM user WHERE identity_id = :identity_id")?
        .query_row(&[(":identity_id", principal.as_str())], map_user_row)
        .optional()?
        .ok_or(Error::NotFound)
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        identity::Principal,
        user::{count_users, ensure_user, get_user_by_identity},
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn ensure_user_creates_user_on_first_access() {
        let conn = get_db_connection();
        let principal = Principal::new("user_2abc");

        let user = ensure_user(&principal, &conn).unwrap();

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.identity_id, "user_2abc");
        assert_eq!(count_users(&conn), Ok(1));
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let conn = get_db_connection();
        let principal = Principal::new("user_2abc");

        let first = ensure_user(&principal, &conn).unwrap();
        let second = ensure_user(&principal, &conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(count_users(&conn), Ok(1));
    }

    #[test]
    fn different_identities_get_different_users() {
        let conn = get_db_connection();

        let alice = ensure_user(&Principal::new("alice"), &conn).unwrap();
        let bob = ensure_user(&Principal::new("bob"), &conn).unwrap();

        assert_ne!(alice.id, bob.id);
        assert_eq!(count_users(&conn), Ok(2));
    }

    #[test]
    fn get_user_fails_for_unknown_identity() {
        let conn = get_db_connection();

        assert_eq!(
            get_user_by_identity(&Principal::new("nobody"), &conn),
            Err(Error::NotFound)
        );
    }
}
