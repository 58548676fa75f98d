//! Card components for the dashboard: the month summary, account cards and
//! the form for adding an account.

use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{
    account::{AccountSummary, AccountType},
    dashboard::aggregation::MonthTotals,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_CHECKBOX_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, format_currency, loading_bar,
    },
};

const CARD_STYLE: &str = "p-4 rounded-lg shadow bg-white dark:bg-gray-800 \
    border border-gray-200 dark:border-gray-700";

fn summary_card(label: &str, amount: Decimal, amount_class: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-summary=(label)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class={ "text-2xl font-semibold " (amount_class) } { (format_currency(amount)) }
        }
    }
}

/// The total balance and this month's income, expenses and net change.
pub(super) fn summary_cards_view(total_balance: Decimal, totals: MonthTotals) -> Markup {
    html! {
        section class="w-full grid gap-4 grid-cols-2 lg:grid-cols-4"
        {
            (summary_card("Total Balance", total_balance, ""))
            (summary_card("Income this month", totals.income, "text-green-700 dark:text-green-300"))
            (summary_card("Expenses this month", totals.expenses, "text-red-700 dark:text-red-300"))
            (summary_card("Net this month", totals.net(), ""))
        }
    }
}

fn account_card(summary: &AccountSummary) -> Markup {
    let account = &summary.account;
    let account_url = format_endpoint(endpoints::ACCOUNT_VIEW, account.id);
    let transaction_label = if summary.transaction_count == 1 {
        "transaction"
    } else {
        "transactions"
    };

    html! {
        article class=(CARD_STYLE) data-account-id=(account.id)
        {
            header class="flex justify-between items-start gap-2"
            {
                div
                {
                    a href=(account_url) class="text-lg font-semibold hover:underline"
                    {
                        (account.name)
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (account.account_type.label())
                    }
                }

                @if account.is_default {
                    span class=(BADGE_STYLE) { "Default" }
                } @else {
                    button
                        type="button"
                        hx-put=(format_endpoint(endpoints::DEFAULT_ACCOUNT, account.id))
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Make default"
                    }
                }
            }

            p class="mt-4 text-2xl font-semibold" { (format_currency(account.balance)) }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (summary.transaction_count) " " (transaction_label)
            }
        }
    }
}

/// A card for each account, or a prompt to create the first one.
pub(super) fn account_cards_view(accounts: &[AccountSummary]) -> Markup {
    html! {
        section class="w-full space-y-4"
        {
            h2 class="text-xl font-semibold" { "Accounts" }

            @if accounts.is_empty() {
                p data-empty-state="true"
                {
                    "You have no accounts yet. Add one below to start tracking your money."
                }
            } @else {
                div class="grid gap-4 md:grid-cols-2 lg:grid-cols-3"
                {
                    @for summary in accounts {
                        (account_card(summary))
                    }
                }
            }
        }
    }
}

/// The form for adding an account.
///
/// The first account is always made the default, so the checkbox is
/// checked and disabled when the user has no accounts yet.
pub(super) fn create_account_form_view(has_accounts: bool) -> Markup {
    html! {
        section class={ "w-full max-w-md " (CARD_STYLE) }
        {
            form
                hx-post=(endpoints::ACCOUNTS_API)
                hx-target-error="#alert-container"
                hx-indicator="#create-account-loading"
                class="space-y-4"
            {
                h2 class="text-xl font-semibold" { "Add Account" }

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        placeholder="Everyday"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="balance" class=(FORM_LABEL_STYLE) { "Opening balance" }

                    div class="input-wrapper w-full"
                    {
                        input
                            name="balance"
                            id="balance"
                            type="number"
                            step="0.01"
                            value="0"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="account_type" class=(FORM_LABEL_STYLE) { "Type" }

                    select name="account_type" id="account_type" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for account_type in AccountType::ALL {
                            option
                                value=(account_type.as_str())
                                selected[account_type == AccountType::default()]
                            {
                                (account_type.label())
                            }
                        }
                    }
                }

                div class="flex items-center gap-2"
                {
                    input
                        name="is_default"
                        id="is_default"
                        type="checkbox"
                        value="true"
                        checked[!has_accounts]
                        disabled[!has_accounts]
                        class=(FORM_CHECKBOX_STYLE);

                    label for="is_default" class="text-sm font-medium"
                    {
                        "Make this my default account"
                    }
                }

                (loading_bar("create-account-loading"))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Account" }
            }

            @if !has_accounts {
                p class="mt-2 text-sm text-gray-500 dark:text-gray-400"
                {
                    "Your first account is always your default account."
                }
            } @else {
                p class="mt-2 text-sm"
                {
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Record a transaction" }
                }
            }
        }
    }
}
