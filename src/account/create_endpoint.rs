//! Defines the endpoints and database function for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, AccountSummary, AccountType, core::map_account_row},
    endpoints,
    identity::Principal,
    transport::{AccountPayload, action_response},
    user::{UserId, ensure_user},
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for creating an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    pub name: String,
    /// The opening balance as typed by the user, e.g. "1234.50".
    pub balance: String,
    #[serde(default)]
    pub account_type: AccountType,
    /// Ignored for a user's first account, which is always the default.
    #[serde(default)]
    pub is_default: bool,
}

/// The JSON body for creating an account through the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    #[serde(deserialize_with = "deserialize_balance")]
    pub balance: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub is_default: bool,
}

/// Read a balance sent as either a JSON string or a JSON number.
///
/// Numbers are kept as text so they go through the same validation as form input.
fn deserialize_balance<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BalanceInput {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match BalanceInput::deserialize(deserializer)? {
        BalanceInput::Text(text) => text,
        BalanceInput::Number(number) => number.to_string(),
    })
}

impl From<CreateAccountRequest> for NewAccount {
    fn from(request: CreateAccountRequest) -> Self {
        Self {
            name: request.name,
            balance: request.balance,
            account_type: request.account_type,
            is_default: request.is_default,
        }
    }
}

/// A route handler for the create account form, redirects to the dashboard on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<NewAccount>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = ensure_user(&principal, &connection)
        .and_then(|user| create_account(user.id, &form, &connection));

    match result {
        Ok(account) => {
            tracing::info!("Created account {} for {principal}", account.id);
            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create account with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for creating an account through the JSON API.
///
/// Always responds with an [ActionResult](crate::transport::ActionResult).
pub async fn create_account_api_endpoint(
    State(state): State<CreateAccountState>,
    Extension(principal): Extension<Principal>,
    request: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return action_response::<AccountPayload>(Err(rejection.into()), "create account");
        }
    };

    let result = state
        .db_connection
        .lock()
        .map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
        .and_then(|connection| {
            let user = ensure_user(&principal, &connection)?;
            create_account(user.id, &request.into(), &connection)
        })
        .map(|account| {
            AccountPayload::from(&AccountSummary {
                account,
                transaction_count: 0,
            })
        });

    action_response(result, "create account")
}

/// Parse the opening balance typed by the user.
///
/// # Errors
///
/// Returns [Error::InvalidBalance] if `text` is not a decimal number.
pub fn parse_balance(text: &str) -> Result<Decimal, Error> {
    text.trim()
        .parse()
        .map_err(|_| Error::InvalidBalance(text.to_owned()))
}

/// Create an account for `user_id`.
///
/// A user's first account is always made the default. When the new account is the
/// default, the previous default is cleared in the same SQL transaction as the insert,
/// so the user never ends up with zero or two default accounts.
///
/// # Errors
///
/// This function will return a:
/// - [Error::EmptyAccountName] if the name is blank,
/// - [Error::InvalidBalance] if the balance is not a number,
/// - [Error::DefaultAccountConflict] if a concurrent write claimed the default first,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// The database is not touched if validation fails.
pub fn create_account(
    user_id: UserId,
    new_account: &NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = new_account.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let balance = parse_balance(&new_account.balance)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let existing_accounts: i64 = transaction.query_row(
        "SELECT COUNT(id) FROM account WHERE user_id = ?1",
        [user_id.as_i64()],
        |row| row.get(0),
    )?;
    let is_default = new_account.is_default || existing_accounts == 0;

    if is_default {
        transaction.execute(
            "UPDATE account SET is_default = 0 WHERE user_id = ?1 AND is_default = 1",
            [user_id.as_i64()],
        )?;
    }

    let account = transaction
        .prepare(
            "INSERT INTO account (user_id, name, account_type, balance, is_default, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, user_id, name, account_type, balance, is_default, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                name,
                new_account.account_type.as_str(),
                balance.to_string(),
                is_default,
                OffsetDateTime::now_utc(),
            ),
            map_account_row,
        )?;

    transaction.commit()?;

    Ok(account)
}

#[cfg(test)]
mod create_account_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        Error,
        account::{AccountType, NewAccount, count_accounts, create_account, list_accounts},
        db::initialize,
        identity::Principal,
        user::{UserId, ensure_user},
    };

    fn get_test_connection() -> (Connection, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = ensure_user(&Principal::new("alice"), &connection).unwrap();

        (connection, user.id)
    }

    fn new_account(name: &str, is_default: bool) -> NewAccount {
        NewAccount {
            name: name.to_owned(),
            balance: "100.50".to_owned(),
            account_type: AccountType::Savings,
            is_default,
        }
    }

    #[track_caller]
    fn assert_single_default(user_id: UserId, connection: &Connection) {
        let defaults = list_accounts(user_id, connection)
            .unwrap()
            .into_iter()
            .filter(|summary| summary.account.is_default)
            .count();

        assert_eq!(defaults, 1, "want exactly one default account, got {defaults}");
    }

    #[test]
    fn first_account_is_always_default() {
        let (connection, user_id) = get_test_connection();

        let account = create_account(user_id, &new_account("Savings", false), &connection).unwrap();

        assert!(account.is_default);
        assert_eq!(account.name, "Savings");
        assert_eq!(account.account_type, AccountType::Savings);
        assert_eq!(account.balance, Decimal::new(10050, 2));
        assert_eq!(account.user_id, user_id);
    }

    #[test]
    fn later_accounts_respect_requested_default() {
        let (connection, user_id) = get_test_connection();
        let first = create_account(user_id, &new_account("First", false), &connection).unwrap();

        let second = create_account(user_id, &new_account("Second", false), &connection).unwrap();

        assert!(!second.is_default);
        assert_eq!(
            list_accounts(user_id, &connection).unwrap()[1].account,
            first
        );
        assert_single_default(user_id, &connection);
    }

    #[test]
    fn new_default_replaces_old_default() {
        let (connection, user_id) = get_test_connection();
        create_account(user_id, &new_account("First", false), &connection).unwrap();

        let second = create_account(user_id, &new_account("Second", true), &connection).unwrap();

        assert!(second.is_default);
        assert_single_default(user_id, &connection);
        let accounts = list_accounts(user_id, &connection).unwrap();
        assert!(!accounts[1].account.is_default);
    }

    #[test]
    fn at_most_one_default_after_every_call() {
        let (connection, user_id) = get_test_connection();

        for (i, is_default) in [false, true, false, true, true, false].into_iter().enumerate() {
            create_account(user_id, &new_account(&format!("Account {i}"), is_default), &connection)
                .unwrap();
            assert_single_default(user_id, &connection);
        }
    }

    #[test]
    fn defaults_are_tracked_per_user() {
        let (connection, alice) = get_test_connection();
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;
        create_account(alice, &new_account("Alice's", false), &connection).unwrap();

        let bobs = create_account(bob, &new_account("Bob's", false), &connection).unwrap();

        assert!(bobs.is_default);
        assert_single_default(alice, &connection);
        assert_single_default(bob, &connection);
    }

    #[test]
    fn non_numeric_balance_is_rejected_without_writing() {
        let (connection, user_id) = get_test_connection();
        let mut account = new_account("Broken", true);
        account.balance = "abc".to_owned();

        let result = create_account(user_id, &account, &connection);

        assert_eq!(result, Err(Error::InvalidBalance("abc".to_owned())));
        assert_eq!(count_accounts(user_id, &connection), Ok(0));
    }

    #[test]
    fn blank_name_is_rejected() {
        let (connection, user_id) = get_test_connection();

        let result = create_account(user_id, &new_account("   ", false), &connection);

        assert_eq!(result, Err(Error::EmptyAccountName));
        assert_eq!(count_accounts(user_id, &connection), Ok(0));
    }

    #[test]
    fn storage_rejects_second_default_row() {
        let (connection, user_id) = get_test_connection();
        create_account(user_id, &new_account("First", true), &connection).unwrap();

        let error = connection
            .execute(
                "INSERT INTO account (user_id, name, account_type, balance, is_default, created_at)
                VALUES (?1, 'Sneaky', 'CURRENT', '0', 1, '2025-01-01 00:00:00.0 +00:00:00')",
                [user_id.as_i64()],
            )
            .unwrap_err();

        assert_eq!(Error::from(error), Error::DefaultAccountConflict);
    }
}
