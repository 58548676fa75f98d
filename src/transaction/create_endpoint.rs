//! Defines the endpoint and database function for recording a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    account::{AccountId, get_account},
    category::validate_category,
    endpoints::{self, format_endpoint},
    identity::Principal,
    transaction::{
        Recurrence, RecurringInterval, Transaction, TransactionType,
        core::{TRANSACTION_COLUMNS, adjust_account_balance, map_transaction_row},
    },
    user::{UserId, ensure_user},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or editing a transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount as typed by the user, e.g. "12.50".
    pub amount: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: Date,
    #[serde(default)]
    pub is_recurring: bool,
    /// Only used when `is_recurring` is set.
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
}

/// A [NewTransaction] that passed validation.
pub(crate) struct ValidatedTransaction<'a> {
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub date: Date,
    pub recurrence: Option<Recurrence>,
}

impl NewTransaction {
    /// Check the user input, without touching the database.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is not a number greater than zero,
    /// - [Error::InvalidCategory] if the category does not exist for the transaction type,
    /// - [Error::MissingRecurringInterval] if the transaction recurs but has no interval.
    pub(crate) fn validate(&self) -> Result<ValidatedTransaction<'_>, Error> {
        let amount = parse_amount(&self.amount)?;
        validate_category(&self.category, self.transaction_type)?;

        let recurrence = if self.is_recurring {
            let interval = self
                .recurring_interval
                .ok_or(Error::MissingRecurringInterval)?;
            Some(Recurrence::starting_from(self.date, interval))
        } else {
            None
        };

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty());

        Ok(ValidatedTransaction {
            account_id: self.account_id,
            transaction_type: self.transaction_type,
            amount,
            category: &self.category,
            description,
            date: self.date,
            recurrence,
        })
    }
}

/// Parse a transaction amount typed by the user.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `text` is not a decimal number greater than zero.
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    match text.trim().parse::<Decimal>() {
        Ok(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(Error::InvalidAmount(text.to_owned())),
    }
}

/// A route handler for creating a new transaction, redirects to the account page on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<NewTransaction>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = ensure_user(&principal, &connection)
        .and_then(|user| create_transaction(user.id, &form, &connection));

    match result {
        Ok(transaction) => (
            HxRedirect(format_endpoint(
                endpoints::ACCOUNT_VIEW,
                transaction.account_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create transaction with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// Record a new transaction for `user_id` and update the account balance.
///
/// Income adds to the balance of the account and expenses subtract from it.
/// The insert and the balance update are committed together.
///
/// # Errors
///
/// This function will return a:
/// - validation error, see [NewTransaction::validate],
/// - [Error::NotFound] if the account does not belong to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let validated = new_transaction.validate()?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    get_account(user_id, validated.account_id, &sql_transaction)?;

    let transaction = sql_transaction
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, account_id, transaction_type, amount, category,
                description, date, recurring_interval, next_recurring_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                validated.account_id,
                validated.transaction_type.as_str(),
                validated.amount.to_string(),
                validated.category,
                validated.description,
                validated.date,
                validated
                    .recurrence
                    .map(|recurrence| recurrence.interval.as_str()),
                validated.recurrence.map(|recurrence| recurrence.next_date),
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    adjust_account_balance(
        transaction.account_id,
        transaction.signed_amount(),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(transaction)
}


#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{AccountType, NewAccount, create_account},
        db::initialize,
        endpoints::{self, format_endpoint},
        identity::Principal,
        test_utils::assert_hx_redirect,
        transaction::{
            NewTransaction, TransactionType, count_transactions,
            create_endpoint::CreateTransactionState, create_transaction_endpoint,
        },
        user::ensure_user,
    };

    #[tokio::test]
    async fn redirects_to_account_page() {
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
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = NewTransaction {
            account_id: account.id,
            transaction_type: TransactionType::Income,
            amount: "1000".to_owned(),
            category: "salary".to_owned(),
            description: None,
            date: date!(2025 - 05 - 01),
            is_recurring: false,
            recurring_interval: None,
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(Principal::new("alice")),
            Form(form),
        )
        .await;

        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::ACCOUNT_VIEW, account.id),
        );
        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(1)
        );
    }

    #[tokio::test]
    async fn invalid_form_responds_with_bad_request() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = NewTransaction {
            account_id: 1,
            transaction_type: TransactionType::Income,
            amount: "lots".to_owned(),
            category: "salary".to_owned(),
            description: None,
            date: date!(2025 - 05 - 01),
            is_recurring: false,
            recurring_interval: None,
        };

        let response = create_transaction_endpoint(
            State(state),
            Extension(Principal::new("alice")),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
