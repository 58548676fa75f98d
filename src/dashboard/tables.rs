//! The table of recent transactions on the dashboard.

use std::collections::HashMap;

use maud::{Markup, html};

use crate::{
    account::{AccountId, AccountSummary},
    category::category_label,
    endpoints::{self, format_endpoint},
    html::{LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
    transaction::{Transaction, edit_transaction_url},
};

/// How many transactions the dashboard shows.
pub(super) const RECENT_TRANSACTION_LIMIT: usize = 10;

/// The newest transactions across all accounts.
///
/// `transactions` must already be ordered newest first.
pub(super) fn recent_transactions_view(
    transactions: &[Transaction],
    accounts: &[AccountSummary],
) -> Markup {
    let account_names: HashMap<AccountId, &str> = accounts
        .iter()
        .map(|summary| (summary.account.id, summary.account.name.as_str()))
        .collect();

    html! {
        section class="w-full space-y-4"
        {
            header class="flex justify-between items-end"
            {
                h2 class="text-xl font-semibold" { "Recent Transactions" }

                a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add Transaction" }
            }

            div class="overflow-x-auto"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class="px-6 py-3" { "Date" }
                            th scope="col" class="px-6 py-3" { "Description" }
                            th scope="col" class="px-6 py-3" { "Category" }
                            th scope="col" class="px-6 py-3" { "Account" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions.iter().take(RECENT_TRANSACTION_LIMIT) {
                            @let amount = transaction.signed_amount();
                            @let amount_class = if amount.is_sign_negative() {
                                "text-red-700 dark:text-red-300"
                            } else {
                                "text-green-700 dark:text-green-300"
                            };
                            tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a href=(edit_transaction_url(transaction)) class="hover:underline"
                                    {
                                        (transaction.description.as_deref().unwrap_or("-"))
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (category_label(&transaction.category)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(format_endpoint(endpoints::ACCOUNT_VIEW, transaction.account_id))
                                        class=(LINK_STYLE)
                                    {
                                        (account_names.get(&transaction.account_id).copied().unwrap_or("Unknown"))
                                    }
                                }
                                td class={ "px-6 py-4 text-right " (amount_class) }
                                {
                                    (format_currency(amount))
                                }
                            }
                        }

                        @if transactions.is_empty() {
                            tr
                            {
                                td colspan="5" data-empty-state="true" class="px-6 py-4 text-center"
                                {
                                    "No transactions yet."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
