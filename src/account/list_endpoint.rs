//! Defines the JSON endpoint for listing the user's accounts.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::list_accounts,
    identity::Principal,
    transport::{AccountPayload, or_empty},
    user::ensure_user,
};

/// The state needed to list accounts.
#[derive(Debug, Clone)]
pub struct ListAccountsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListAccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the user's accounts, newest first.
///
/// Responds with an empty list if the accounts could not be read.
pub async fn list_accounts_api_endpoint(
    State(state): State<ListAccountsState>,
    Extension(principal): Extension<Principal>,
) -> Json<Vec<AccountPayload>> {
    let result = state
        .db_connection
        .lock()
        .map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
        .and_then(|connection| {
            let user = ensure_user(&principal, &connection)?;
            list_accounts(user.id, &connection)
        });

    let accounts = or_empty(result, "accounts")
        .iter()
        .map(AccountPayload::from)
        .collect();

    Json(accounts)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;

    use crate::{
        account::{
            AccountType, NewAccount, create_account,
            list_endpoint::{ListAccountsState, list_accounts_api_endpoint},
        },
        db::initialize,
        identity::Principal,
        user::ensure_user,
    };

    #[tokio::test]
    async fn lists_only_own_accounts_newest_first() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let alice = ensure_user(&Principal::new("alice"), &connection).unwrap().id;
        let bob = ensure_user(&Principal::new("bob"), &connection).unwrap().id;
        for (user_id, name) in [(alice, "First"), (bob, "Bob's"), (alice, "Second")] {
            create_account(
                user_id,
                &NewAccount {
                    name: name.to_owned(),
                    balance: "12.5".to_owned(),
                    account_type: AccountType::Savings,
                    is_default: false,
                },
                &connection,
            )
            .unwrap();
        }
        let state = ListAccountsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let accounts = list_accounts_api_endpoint(State(state), Extension(Principal::new("alice")))
            .await
            .0;

        let names: Vec<&str> = accounts.iter().map(|account| account.name.as_str()).collect();
        assert_eq!(names, ["Second", "First"]);
        assert_eq!(accounts[0].balance, 12.5);
        assert!(accounts[1].is_default);
    }

    #[tokio::test]
    async fn read_failure_degrades_to_empty_list() {
        let connection = Connection::open_in_memory().unwrap();
        let state = ListAccountsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let accounts = list_accounts_api_endpoint(State(state), Extension(Principal::new("alice")))
            .await
            .0;

        assert!(accounts.is_empty());
    }
}
