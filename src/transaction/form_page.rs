//! Defines the route handler for the page for creating or editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, AccountSummary, list_accounts},
    category::categories_for,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, dollar_input_styles, link, loading_bar,
    },
    identity::Principal,
    navigation::NavBar,
    timezone::current_local_date,
    transaction::{RecurringInterval, Transaction, TransactionId, TransactionType, get_transaction},
    transport::or_empty,
    user::ensure_user,
};

/// The query parameters for the transaction form page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFormQuery {
    /// The transaction to edit, a new transaction is created when not set.
    pub edit: Option<TransactionId>,
    /// The account to select when creating a transaction.
    pub account_id: Option<AccountId>,
}

/// The state needed for the transaction form page.
#[derive(Debug, Clone)]
pub struct TransactionFormPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionFormPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the form for creating a transaction, or editing one with `?edit={id}`.
pub async fn get_transaction_form_page(
    State(state): State<TransactionFormPageState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<TransactionFormQuery>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = ensure_user(&principal, &connection)?;
    let accounts = or_empty(list_accounts(user.id, &connection), "accounts");
    let existing = query
        .edit
        .map(|id| get_transaction(user.id, id, &connection))
        .transpose()
        .inspect_err(|error| tracing::error!("Could not load transaction to edit: {error}"))?;

    let selected_account = existing
        .as_ref()
        .map(|transaction| transaction.account_id)
        .or(query.account_id)
        .or_else(|| {
            accounts
                .iter()
                .find(|summary| summary.account.is_default)
                .map(|summary| summary.account.id)
        });

    Ok(transaction_form_view(
        &principal,
        &accounts,
        selected_account,
        existing.as_ref(),
        today,
    )
    .into_response())
}

fn transaction_form_view(
    principal: &Principal,
    accounts: &[AccountSummary],
    selected_account: Option<AccountId>,
    existing: Option<&Transaction>,
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW, principal).into_html();
    let title = if existing.is_some() {
        "Edit Transaction"
    } else {
        "New Transaction"
    };
    let transaction_type = existing.map_or(TransactionType::Expense, |transaction| {
        transaction.transaction_type
    });
    let amount = existing.map(|transaction| transaction.amount.to_string());
    let category = existing.map(|transaction| transaction.category.as_str());
    let description = existing.and_then(|transaction| transaction.description.as_deref());
    let date = existing.map_or(today, |transaction| transaction.date);
    let interval = existing
        .and_then(|transaction| transaction.recurrence)
        .map(|recurrence| recurrence.interval);

    let form = html! {
        h2 class="text-xl font-bold" { (title) }

        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select name="account_id" id="account_id" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for summary in accounts {
                    option
                        value=(summary.account.id)
                        selected[selected_account == Some(summary.account.id)]
                    {
                        (summary.account.name)
                    }
                }
            }
        }

        fieldset
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class="flex gap-6"
            {
                @for option_type in TransactionType::ALL {
                    label class="inline-flex items-center gap-2"
                    {
                        input
                            type="radio"
                            name="type"
                            value=(option_type.as_str())
                            checked[option_type == transaction_type]
                            required;

                        (option_type.label())
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[amount]
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category" id="category" required class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a category" }

                @for option_type in TransactionType::ALL {
                    optgroup label=(option_type.label())
                    {
                        @for option in categories_for(option_type) {
                            option value=(option.key) selected[category == Some(option.key)]
                            {
                                (option.label)
                            }
                        }
                    }
                }
            }
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                required
                value=(date)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div class="flex items-center gap-2"
        {
            input
                name="is_recurring"
                id="is_recurring"
                type="checkbox"
                value="true"
                checked[interval.is_some()]
                class=(FORM_CHECKBOX_STYLE);

            label for="is_recurring" class="text-sm font-medium" { "Recurring" }
        }

        div
        {
            label for="recurring_interval" class=(FORM_LABEL_STYLE) { "Repeats" }

            select name="recurring_interval" id="recurring_interval" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Does not repeat" }

                @for option in RecurringInterval::ALL {
                    option value=(option.as_str()) selected[interval == Some(option)]
                    {
                        (option.label())
                    }
                }
            }
        }

        (loading_bar("transaction-form-loading"))

        button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
        {
            @if existing.is_some() { "Save Transaction" } @else { "Create Transaction" }
        }
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            @if accounts.is_empty() {
                p
                {
                    "You need an account before you can record transactions. Create one on the "
                    (link(endpoints::DASHBOARD_VIEW, "dashboard"))
                    "."
                }
            } @else if let Some(transaction) = existing {
                form
                    hx-put=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                    hx-target-error="#alert-container"
                    hx-indicator="#transaction-form-loading"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (form)
                }
            } @else {
                form
                    hx-post=(endpoints::TRANSACTIONS_API)
                    hx-target-error="#alert-container"
                    hx-indicator="#transaction-form-loading"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (form)
                }
            }
        }
    };

    base(title, &[dollar_input_styles()], &content)
}
