//! Defines the endpoint for making an account the user's default account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_account},
    endpoints,
    identity::Principal,
    user::{UserId, ensure_user},
};

/// The state needed to change the default account.
#[derive(Debug, Clone)]
pub struct SetDefaultAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SetDefaultAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for making an account the default, redirects to the dashboard on success.
pub async fn set_default_account_endpoint(
    State(state): State<SetDefaultAccountState>,
    Extension(principal): Extension<Principal>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = ensure_user(&principal, &connection)
        .and_then(|user| set_default_account(user.id, account_id, &connection));

    match result {
        Ok(_) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not make account {account_id} the default: {error}");
            error.into_alert_response()
        }
    }
}

/// Make `account_id` the only default account of `user_id`.
///
/// The old default is cleared and the new one marked in a single SQL transaction.
///
/// # Errors
///
/// This function will return a:
/// - [Error::UpdateMissingAccount] if the account does not exist or belongs to another user,
/// - [Error::DefaultAccountConflict] if a concurrent write claimed the default first,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_default_account(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "UPDATE account SET is_default = 0 WHERE user_id = ?1 AND is_default = 1 AND id != ?2",
        (user_id.as_i64(), account_id),
    )?;

    let rows_affected = transaction.execute(
        "UPDATE account SET is_default = 1 WHERE user_id = ?1 AND id = ?2",
        (user_id.as_i64(), account_id),
    )?;

    // Dropping the transaction rolls back the cleared default.
    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    transaction.commit()?;

    get_account(user_id, account_id, connection)
}
