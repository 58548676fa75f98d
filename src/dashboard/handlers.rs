//! HTTP handlers for the dashboard page and its JSON feed.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountSummary, list_accounts},
    dashboard::{
        aggregation::{month_totals, total_balance},
        cards::{account_cards_view, create_account_form_view, summary_cards_view},
        tables::recent_transactions_view,
    },
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, dollar_input_styles},
    identity::Principal,
    navigation::NavBar,
    timezone::current_local_date,
    transaction::{Transaction, list_dashboard_transactions},
    transport::{TransactionPayload, or_empty},
    user::ensure_user,
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the user's accounts, this month's totals and their recent transactions.
///
/// Accounts and transactions that cannot be read are shown as empty lists.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (accounts, transactions) = match ensure_user(&principal, &connection) {
        Ok(user) => (
            or_empty(list_accounts(user.id, &connection), "accounts"),
            or_empty(
                list_dashboard_transactions(user.id, &connection),
                "dashboard transactions",
            ),
        ),
        Err(error) => {
            tracing::error!("Could not get user {principal}, showing an empty dashboard: {error}");
            (Vec::new(), Vec::new())
        }
    };

    Ok(dashboard_view(&principal, &accounts, &transactions, today).into_response())
}

fn dashboard_view(
    principal: &Principal,
    accounts: &[AccountSummary],
    transactions: &[Transaction],
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, principal).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full space-y-8 lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                (summary_cards_view(total_balance(accounts), month_totals(transactions, today)))
                (account_cards_view(accounts))
                (create_account_form_view(!accounts.is_empty()))
                (recent_transactions_view(transactions, accounts))
            }
        }
    };

    base("Dashboard", &[dollar_input_styles()], &content)
}

/// A route handler for the transactions shown on the dashboard, newest first.
///
/// Responds with an empty list if the transactions could not be read.
pub async fn list_dashboard_transactions_api_endpoint(
    State(state): State<DashboardState>,
    Extension(principal): Extension<Principal>,
) -> Json<Vec<TransactionPayload>> {
    let result = state
        .db_connection
        .lock()
        .map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
        .and_then(|connection| {
            let user = ensure_user(&principal, &connection)?;
            list_dashboard_transactions(user.id, &connection)
        });

    let transactions = or_empty(result, "dashboard transactions")
        .iter()
        .map(TransactionPayload::from)
        .collect();

    Json(transactions)
}
