//! HTML rendering for the transaction table on the account page.

use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{
    category::{category_color, category_label},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_OUTLINE_STYLE, BUTTON_SECONDARY_STYLE, FORM_CHECKBOX_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        edit_delete_action_links, format_currency, loading_bar,
    },
    transaction::{
        Transaction, TransactionType,
        table::{RecurringFilter, SortDirection, SortField, TransactionTable},
    },
};

/// The id of the element that table controls replace.
pub(crate) const TABLE_CONTAINER_ID: &str = "transaction-table";
const TABLE_LOADING_ID: &str = "transaction-table-loading";
const COLUMN_COUNT: usize = 6;

fn amount_class(amount: Decimal) -> &'static str {
    if amount.is_sign_negative() {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    }
}

/// The URL of the page for editing `transaction`.
pub(crate) fn edit_transaction_url(transaction: &Transaction) -> String {
    format!("{}?edit={}", endpoints::NEW_TRANSACTION_VIEW, transaction.id)
}

/// Render the transaction table with its filter controls and bulk actions.
///
/// `route` is the path of the page the table is on. Every control requests
/// `route` with the next table state and swaps in the new table.
pub(crate) fn transaction_table_view(table: &TransactionTable, route: &str) -> Markup {
    let rows = table.visible();
    let selected = table.selected();
    let container_selector = format!("#{TABLE_CONTAINER_ID}");
    let indicator_selector = format!("#{TABLE_LOADING_ID}");

    let mut select_all = table.clone();
    select_all.toggle_select_all();
    let select_all_url = select_all.to_query().to_url(route);

    let mut after_delete = table.clone();
    let delete_request = after_delete.begin_bulk_delete();
    after_delete.finish_bulk_delete(true);
    let redirect_url = after_delete.to_query().to_url(route);

    let query = table.to_query();

    html! {
        div id=(TABLE_CONTAINER_ID) class="w-full space-y-4"
        {
            form
                hx-get=(route)
                hx-trigger="input changed delay:300ms from:input[name='search'], change"
                hx-target=(container_selector)
                hx-select=(container_selector)
                hx-swap="outerHTML"
                hx-push-url="true"
                hx-indicator=(indicator_selector)
                class="flex flex-wrap gap-4 items-end"
            {
                input
                    type="search"
                    name="search"
                    value=(table.search)
                    placeholder="Search descriptions"
                    aria-label="Search descriptions"
                    class=(FORM_TEXT_INPUT_STYLE);

                select name="type" aria-label="Type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[table.type_filter.is_none()] { "All types" }

                    @for transaction_type in TransactionType::ALL {
                        option
                            value=(transaction_type.as_str())
                            selected[table.type_filter == Some(transaction_type)]
                        {
                            (transaction_type.label())
                        }
                    }
                }

                select name="recurring" aria-label="Recurrence" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[table.recurring_filter.is_none()] { "All transactions" }

                    @for recurring_filter in RecurringFilter::ALL {
                        option
                            value=(recurring_filter.as_query_value())
                            selected[table.recurring_filter == Some(recurring_filter)]
                        {
                            (recurring_filter.label())
                        }
                    }
                }

                input type="hidden" name="sort" value=(table.sort.field.as_query_value());
                input type="hidden" name="direction" value=(table.sort.direction.as_query_value());

                @for id in &query.selected {
                    input type="hidden" name="selected" value=(id);
                }
            }

            div class="flex items-center justify-between gap-4"
            {
                span class="text-sm" data-selected-count=(selected.len())
                {
                    (selected.len()) " selected"
                }

                form
                    hx-post=(endpoints::BULK_DELETE_TRANSACTIONS)
                    hx-confirm="Delete selected transactions?"
                    hx-target-error="#alert-container"
                    hx-indicator=(indicator_selector)
                    hx-disabled-elt="find button"
                {
                    @if let Some(request) = &delete_request {
                        @for id in &request.ids {
                            input type="hidden" name="ids" value=(id);
                        }

                        @if let Some(account_id) = request.account_id {
                            input type="hidden" name="account_id" value=(account_id);
                        }
                    }

                    input type="hidden" name="redirect_url" value=(redirect_url);

                    button
                        type="submit"
                        disabled[delete_request.is_none()]
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Delete selected"
                    }
                }
            }

            (loading_bar(TABLE_LOADING_ID))

            div class="overflow-x-auto"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class="px-6 py-3"
                            {
                                input
                                    type="checkbox"
                                    aria-label="Select all"
                                    data-select-all="true"
                                    checked[table.all_visible_selected()]
                                    disabled[rows.is_empty()]
                                    hx-get=(select_all_url)
                                    hx-target=(container_selector)
                                    hx-select=(container_selector)
                                    hx-swap="outerHTML"
                                    hx-push-url="true"
                                    class=(FORM_CHECKBOX_STYLE);
                            }

                            (sort_header(table, SortField::Date, route))
                            th scope="col" class="px-6 py-3" { "Description" }
                            (sort_header(table, SortField::Category, route))
                            (sort_header(table, SortField::Amount, route))
                            th scope="col" class="px-6 py-3" { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for transaction in &rows {
                            (transaction_row_view(table, transaction, route))
                        }

                        @if rows.is_empty() {
                            tr
                            {
                                td
                                    colspan=(COLUMN_COUNT)
                                    data-empty-state="true"
                                    class="px-6 py-4 text-center"
                                {
                                    @if table.source().is_empty() {
                                        "No transactions yet. "
                                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                        {
                                            "Add a transaction"
                                        }
                                    } @else {
                                        "No transactions match the current filters."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn sort_header(table: &TransactionTable, field: SortField, route: &str) -> Markup {
    let mut next = table.clone();
    next.toggle_sort(field);
    let url = next.to_query().to_url(route);
    let container_selector = format!("#{TABLE_CONTAINER_ID}");

    let (indicator, aria_sort) = match table.sort {
        sort if sort.field != field => ("", "none"),
        sort if sort.direction == SortDirection::Asc => (" ▲", "ascending"),
        _ => (" ▼", "descending"),
    };

    html! {
        th scope="col" class="px-6 py-3" aria-sort=(aria_sort)
        {
            a
                href=(url)
                hx-get=(url)
                hx-target=(container_selector)
                hx-select=(container_selector)
                hx-swap="outerHTML"
                hx-push-url="true"
                data-sort-field=(field.as_query_value())
                class="hover:underline"
            {
                (field.label()) (indicator)
            }
        }
    }
}

fn transaction_row_view(table: &TransactionTable, transaction: &Transaction, route: &str) -> Markup {
    let mut next = table.clone();
    next.toggle_selected(transaction.id);
    let toggle_url = next.to_query().to_url(route);
    let container_selector = format!("#{TABLE_CONTAINER_ID}");

    let amount = transaction.signed_amount();
    let description = transaction.description.as_deref().unwrap_or("-");
    let confirm_message = format!(
        "Are you sure you want to delete the transaction '{description}'? This cannot be undone."
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                input
                    type="checkbox"
                    aria-label="Select transaction"
                    checked[table.is_selected(transaction.id)]
                    hx-get=(toggle_url)
                    hx-target=(container_selector)
                    hx-select=(container_selector)
                    hx-swap="outerHTML"
                    hx-push-url="true"
                    class=(FORM_CHECKBOX_STYLE);
            }

            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.date) { (transaction.date) }
            }

            td class=(TABLE_CELL_STYLE)
            {
                (description)

                @if let Some(recurrence) = &transaction.recurrence {
                    " "
                    span class=(BADGE_OUTLINE_STYLE) title={ "Next due " (recurrence.next_date) }
                    {
                        (recurrence.interval.label())
                    }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                span class="inline-flex items-center gap-2"
                {
                    span
                        class="inline-block w-2 h-2 rounded-full"
                        style={ "background-color: " (category_color(&transaction.category)) }
                    {}

                    (category_label(&transaction.category))
                }
            }

            td class={ "px-6 py-4 text-right " (amount_class(amount)) }
            {
                (format_currency(amount))
            }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_transaction_url(transaction),
                        &format_endpoint(endpoints::TRANSACTION, transaction.id),
                        &confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}
