//! Defines the endpoints and database function for deleting transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, OptionalExtension, Transaction as SqlTransaction, TransactionBehavior};
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::AccountId,
    alert::Alert,
    db::{get_decimal, get_parsed},
    endpoints::{self, format_endpoint},
    identity::Principal,
    transaction::{
        TransactionId, TransactionType,
        core::{adjust_account_balance, signed_amount},
    },
    transport::action_response,
    user::{UserId, ensure_user},
};

/// The state needed to delete transactions.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a single transaction from a table row.
///
/// On success the response body only holds an out-of-band alert, so htmx
/// replaces the row with nothing.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(principal): Extension<Principal>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = ensure_user(&principal, &connection)
        .and_then(|user| bulk_delete_transactions(user.id, &[transaction_id], &connection));

    match result {
        Ok(0) => Error::DeleteMissingTransaction.into_alert_response(),
        // The status code has to be 200 OK or htmx will not delete the table row.
        Ok(_) => Alert::SuccessSimple {
            message: "Transaction deleted".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// The form sent by the bulk delete button of the transaction table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkDeleteForm {
    /// The selected transactions, sent as repeated `ids` fields.
    #[serde(default)]
    pub ids: Vec<TransactionId>,
    /// The account whose page should be shown afterwards.
    pub account_id: Option<AccountId>,
    /// Where to send the client afterwards, e.g. the table with the selection cleared.
    pub redirect_url: Option<String>,
}

/// A route handler for deleting the selected rows of the transaction table.
pub async fn bulk_delete_transactions_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<BulkDeleteForm>,
) -> Response {
    if form.ids.is_empty() {
        return Error::EmptySelection.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = ensure_user(&principal, &connection)
        .and_then(|user| bulk_delete_transactions(user.id, &form.ids, &connection));

    match result {
        Ok(deleted) => {
            tracing::info!("Deleted {deleted} of {} selected transactions", form.ids.len());
            (
                HxRedirect(redirect_after_delete(&form)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete transactions {:?}: {error}", form.ids);
            error.into_alert_response()
        }
    }
}

/// Only same-site paths are followed, anything else falls back to the account or dashboard page.
fn redirect_after_delete(form: &BulkDeleteForm) -> String {
    match (&form.redirect_url, form.account_id) {
        (Some(url), _) if url.starts_with('/') && !url.starts_with("//") => url.clone(),
        (_, Some(account_id)) => format_endpoint(endpoints::ACCOUNT_VIEW, account_id),
        (_, None) => endpoints::DASHBOARD_VIEW.to_owned(),
    }
}

/// The JSON body for deleting transactions through the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequestBody {
    pub ids: Vec<TransactionId>,
    /// Only used by clients to decide which view to refresh.
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

/// A route handler for deleting transactions through the JSON API.
///
/// Responds with an [ActionResult](crate::transport::ActionResult) holding the number of
/// transactions deleted.
pub async fn bulk_delete_transactions_api_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<BulkDeleteRequestBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return action_response::<RowsAffected>(Err(rejection.into()), "delete transactions");
        }
    };

    let result = if body.ids.is_empty() {
        Err(Error::EmptySelection)
    } else {
        state
            .db_connection
            .lock()
            .map_err(|error| {
                tracing::error!("Could not acquire database lock: {error}");
                Error::DatabaseLockError
            })
            .and_then(|connection| {
                let user = ensure_user(&principal, &connection)?;
                bulk_delete_transactions(user.id, &body.ids, &connection)
            })
    };

    action_response(result, "delete transactions")
}

type RowsAffected = usize;

/// Delete the transactions in `ids` that belong to `user_id` and reverse their
/// effect on account balances.
///
/// IDs of transactions that do not exist or belong to someone else are skipped.
/// All deletes and balance updates are committed together.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an SQL error, in which case nothing is deleted.
pub fn bulk_delete_transactions(
    user_id: UserId,
    ids: &[TransactionId],
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let mut rows_affected = 0;

    {
        let mut statement = sql_transaction.prepare(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id
            RETURNING account_id, transaction_type, amount",
        )?;

        for id in ids {
            let deleted = statement
                .query_row(&[(":id", id), (":user_id", &user_id.as_i64())], |row| {
                    Ok((
                        row.get::<_, AccountId>(0)?,
                        get_parsed::<TransactionType>(row, 1)?,
                        get_decimal(row, 2)?,
                    ))
                })
                .optional()?;

            if let Some((account_id, transaction_type, amount)) = deleted {
                adjust_account_balance(
                    account_id,
                    -signed_amount(transaction_type, amount),
                    &sql_transaction,
                )?;
                rows_affected += 1;
            }
        }
    }

    sql_transaction.commit()?;

    Ok(rows_affected)
}

#[cfg(test)]
mod bulk_delete_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, AccountType, NewAccount, create_account, get_account},
        db::initialize,
        identity::Principal,
        transaction::{
            NewTransaction, Transaction, TransactionType, bulk_delete_transactions,
            count_transactions, create_transaction, get_transaction,
        },
        user::{UserId, ensure_user},
    };

    fn get_test_connection() -> (Connection, UserId, Account) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = ensure_user(&Principal::new("alice"), &connection).unwrap().id;
        let account = create_account(
            user_id,
            &NewAccount {
                name: "Everyday".to_owned(),
                balance: "50".to_owned(),
                account_type: AccountType::Current,
                is_default: true,
            },
            &connection,
        )
        .unwrap();

        (connection, user_id, account)
    }

    fn create(
        user_id: UserId,
        account: &Account,
        transaction_type: TransactionType,
        amount: &str,
        connection: &Connection,
    ) -> Transaction {
        let category = match transaction_type {
            TransactionType::Income => "salary",
            TransactionType::Expense => "food",
        };

        create_transaction(
            user_id,
            &NewTransaction {
                account_id: account.id,
                transaction_type,
                amount: amount.to_owned(),
                category: category.to_owned(),
                description: None,
                date: date!(2025 - 01 - 01),
                is_recurring: false,
                recurring_interval: None,
            },
            connection,
        )
        .unwrap()
    }

    #[test]
    fn deletes_selected_and_restores_balance() {
        let (connection, user_id, account) = get_test_connection();
        let t1 = create(user_id, &account, TransactionType::Expense, "10", &connection);
        let t2 = create(user_id, &account, TransactionType::Income, "25", &connection);
        let t3 = create(user_id, &account, TransactionType::Expense, "5", &connection);

        let deleted = bulk_delete_transactions(user_id, &[t1.id, t2.id], &connection).unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(count_transactions(&connection), Ok(1));
        assert_eq!(get_transaction(user_id, t3.id, &connection), Ok(t3));
        assert_eq!(
            get_account(user_id, account.id, &connection).unwrap().balance,
            Decimal::new(45, 0)
        );
    }

    #[test]
    fn skips_missing_and_foreign_ids() {
        let (connection, user_id, account) = get_test_connection();
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;
        let t1 = create(user_id, &account, TransactionType::Expense, "10", &connection);

        let deleted = bulk_delete_transactions(bob, &[t1.id, 999], &connection).unwrap();

        assert_eq!(deleted, 0);
        assert_eq!(get_transaction(user_id, t1.id, &connection), Ok(t1));
    }

    #[test]
    fn empty_selection_deletes_nothing() {
        let (connection, user_id, account) = get_test_connection();
        create(user_id, &account, TransactionType::Expense, "10", &connection);

        assert_eq!(bulk_delete_transactions(user_id, &[], &connection), Ok(0));
        assert_eq!(count_transactions(&connection), Ok(1));
    }

    #[test]
    fn deleted_transaction_cannot_be_fetched() {
        let (connection, user_id, account) = get_test_connection();
        let t1 = create(user_id, &account, TransactionType::Expense, "10", &connection);

        bulk_delete_transactions(user_id, &[t1.id], &connection).unwrap();

        assert_eq!(
            get_transaction(user_id, t1.id, &connection),
            Err(Error::NotFound)
        );
    }
}
