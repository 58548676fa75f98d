//! Defines the route handler for the page showing a single account and its transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_account},
    endpoints::{self, format_endpoint},
    html::{BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    identity::Principal,
    navigation::NavBar,
    transaction::{TableQuery, TransactionTable, list_account_transactions, transaction_table_view},
    transport::or_empty,
    user::ensure_user,
};

/// The state needed for the account page.
#[derive(Debug, Clone)]
pub struct AccountPageState {
    /// The database connection for reading accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render an account with its transaction table.
///
/// The filter, sort and selection state of the table is read from the query string.
pub async fn get_account_page(
    State(state): State<AccountPageState>,
    Extension(principal): Extension<Principal>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<TableQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = ensure_user(&principal, &connection)?;
    let account = get_account(user.id, account_id, &connection)?;
    let transactions = or_empty(
        list_account_transactions(user.id, account_id, &connection),
        "account transactions",
    );

    let table = TransactionTable::from_query(transactions, query);

    Ok(account_view(&principal, &account, &table).into_response())
}

fn account_view(principal: &Principal, account: &Account, table: &TransactionTable) -> Markup {
    let route = format_endpoint(endpoints::ACCOUNT_VIEW, account.id);
    let nav_bar = NavBar::new(&route, principal).into_html();
    let new_transaction_url = format!(
        "{}?account_id={}",
        endpoints::NEW_TRANSACTION_VIEW,
        account.id
    );

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full space-y-4 lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    div
                    {
                        h1 class="text-xl font-bold"
                        {
                            (account.name)

                            @if account.is_default {
                                " "
                                span class=(BADGE_STYLE) { "Default" }
                            }
                        }

                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            (account.account_type.label()) " account"
                        }
                    }

                    div class="text-right"
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                        p class="text-2xl font-semibold" data-account-balance="true"
                        {
                            (format_currency(account.balance))
                        }
                    }

                    a href=(new_transaction_url) class=(LINK_STYLE) { "Add Transaction" }
                }

                (transaction_table_view(table, &route))
            }
        }
    };

    base(&account.name, &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        Error,
        account::{
            Account, AccountType, NewAccount, create_account,
            account_page::{AccountPageState, get_account_page},
        },
        db::initialize,
        identity::Principal,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        transaction::{NewTransaction, TableQuery, TransactionType, create_transaction},
        user::ensure_user,
    };

    fn get_state() -> (AccountPageState, Account) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = ensure_user(&Principal::new("alice"), &connection).unwrap().id;
        let account = create_account(
            user_id,
            &NewAccount {
                name: "Everyday".to_owned(),
                balance: "100".to_owned(),
                account_type: AccountType::Current,
                is_default: true,
            },
            &connection,
        )
        .unwrap();

        for (description, category, transaction_type) in [
            ("Salary", "salary", TransactionType::Income),
            ("Coffee", "food", TransactionType::Expense),
        ] {
            create_transaction(
                user_id,
                &NewTransaction {
                    account_id: account.id,
                    transaction_type,
                    amount: "10".to_owned(),
                    category: category.to_owned(),
                    description: Some(description.to_owned()),
                    date: date!(2025 - 05 - 01),
                    is_recurring: false,
                    recurring_interval: None,
                },
                &connection,
            )
            .unwrap();
        }

        let state = AccountPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, account)
    }

    #[tokio::test]
    async fn shows_balance_and_transactions() {
        let (state, account) = get_state();

        let response = get_account_page(
            State(state),
            Extension(Principal::new("alice")),
            Path(account.id),
            Query(TableQuery::default()),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let balance = document
            .select(&Selector::parse("[data-account-balance]").unwrap())
            .next()
            .expect("no balance")
            .text()
            .collect::<String>();
        assert_eq!(balance.trim(), "$100.00");
        let rows = document
            .select(&Selector::parse("tr[data-transaction-id]").unwrap())
            .count();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn applies_table_query() {
        let (state, account) = get_state();

        let response = get_account_page(
            State(state),
            Extension(Principal::new("alice")),
            Path(account.id),
            Query(TableQuery {
                search: Some("coffee".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let rows = document
            .select(&Selector::parse("tr[data-transaction-id]").unwrap())
            .count();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn other_users_account_is_not_found() {
        let (state, account) = get_state();

        let result = get_account_page(
            State(state),
            Extension(Principal::new("mallory")),
            Path(account.id),
            Query(TableQuery::default()),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
