use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    AppState, Error,
    account::get_account,
    endpoints::{self, format_endpoint},
    identity::Principal,
    transaction::{
        NewTransaction, Transaction, TransactionId,
        core::{TRANSACTION_COLUMNS, adjust_account_balance, get_transaction, map_transaction_row},
    },
    user::{UserId, ensure_user},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for editing a transaction, redirects to the account page on success.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(principal): Extension<Principal>,
    Path(transaction_id): Path<TransactionId>,
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
        .and_then(|user| update_transaction(user.id, transaction_id, &form, &connection));

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
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Replace the details of one of the user's transactions.
///
/// The effect of the old version on its account balance is reversed and the
/// effect of the new version applied, so moving a transaction between accounts
/// or changing its type keeps both balances correct.
///
/// # Errors
///
/// This function will return a:
/// - validation error, see [NewTransaction::validate],
/// - [Error::UpdateMissingTransaction] if `id` is not one of the user's transactions,
/// - [Error::NotFound] if the new account does not belong to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserId,
    id: TransactionId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let validated = new_transaction.validate()?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let old = get_transaction(user_id, id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;
    get_account(user_id, validated.account_id, &sql_transaction)?;

    adjust_account_balance(old.account_id, -old.signed_amount(), &sql_transaction)?;

    let transaction = sql_transaction
        .prepare(&format!(
            "UPDATE \"transaction\"
            SET account_id = ?1,
                transaction_type = ?2,
                amount = ?3,
                category = ?4,
                description = ?5,
                date = ?6,
                recurring_interval = ?7,
                next_recurring_date = ?8
            WHERE id = ?9 AND user_id = ?10
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
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
                id,
                user_id.as_i64(),
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
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, AccountType, NewAccount, create_account, get_account},
        db::initialize,
        identity::Principal,
        transaction::{
            NewTransaction, RecurringInterval, TransactionType, create_transaction,
            get_transaction, update_transaction,
        },
        user::{UserId, ensure_user},
    };

    fn get_test_connection() -> (Connection, UserId, Account, Account) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = ensure_user(&Principal::new("alice"), &connection).unwrap().id;
        let create = |name: &str| {
            create_account(
                user_id,
                &NewAccount {
                    name: name.to_owned(),
                    balance: "100".to_owned(),
                    account_type: AccountType::Current,
                    is_default: false,
                },
                &connection,
            )
            .unwrap()
        };
        let everyday = create("Everyday");
        let savings = create("Savings");

        (connection, user_id, everyday, savings)
    }

    fn expense(account: &Account, amount: &str) -> NewTransaction {
        NewTransaction {
            account_id: account.id,
            transaction_type: TransactionType::Expense,
            amount: amount.to_owned(),
            category: "groceries".to_owned(),
            description: Some("Weekly shop".to_owned()),
            date: date!(2025 - 04 - 12),
            is_recurring: false,
            recurring_interval: None,
        }
    }

    #[track_caller]
    fn assert_balance(connection: &Connection, user_id: UserId, account: &Account, want: Decimal) {
        let got = get_account(user_id, account.id, connection).unwrap().balance;
        assert_eq!(got, want, "want balance {want} for {}, got {got}", account.name);
    }

    #[test]
    fn updates_fields_and_balance() {
        let (connection, user_id, everyday, _) = get_test_connection();
        let created = create_transaction(user_id, &expense(&everyday, "30"), &connection).unwrap();
        let mut form = expense(&everyday, "45.25");
        form.is_recurring = true;
        form.recurring_interval = Some(RecurringInterval::Weekly);

        let updated = update_transaction(user_id, created.id, &form, &connection).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, Decimal::new(4525, 2));
        assert_eq!(
            updated.recurrence.map(|recurrence| recurrence.next_date),
            Some(date!(2025 - 04 - 19))
        );
        assert_eq!(get_transaction(user_id, created.id, &connection), Ok(updated));
        assert_balance(&connection, user_id, &everyday, Decimal::new(5475, 2));
    }

    #[test]
    fn changing_type_flips_balance_effect() {
        let (connection, user_id, everyday, _) = get_test_connection();
        let created = create_transaction(user_id, &expense(&everyday, "10"), &connection).unwrap();
        let mut form = expense(&everyday, "10");
        form.transaction_type = TransactionType::Income;
        form.category = "other-income".to_owned();

        update_transaction(user_id, created.id, &form, &connection).unwrap();

        assert_balance(&connection, user_id, &everyday, Decimal::new(110, 0));
    }

    #[test]
    fn moving_account_updates_both_balances() {
        let (connection, user_id, everyday, savings) = get_test_connection();
        let created = create_transaction(user_id, &expense(&everyday, "20"), &connection).unwrap();

        update_transaction(user_id, created.id, &expense(&savings, "20"), &connection).unwrap();

        assert_balance(&connection, user_id, &everyday, Decimal::new(100, 0));
        assert_balance(&connection, user_id, &savings, Decimal::new(80, 0));
    }

    #[test]
    fn missing_transaction_is_reported() {
        let (connection, user_id, everyday, _) = get_test_connection();

        let result = update_transaction(user_id, 42, &expense(&everyday, "1"), &connection);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
        assert_balance(&connection, user_id, &everyday, Decimal::new(100, 0));
    }

    #[test]
    fn other_users_transaction_is_not_updated() {
        let (connection, user_id, everyday, _) = get_test_connection();
        let created = create_transaction(user_id, &expense(&everyday, "5"), &connection).unwrap();
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;

        let result = update_transaction(bob, created.id, &expense(&everyday, "50"), &connection);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
        assert_eq!(get_transaction(user_id, created.id, &connection), Ok(created));
    }
}
