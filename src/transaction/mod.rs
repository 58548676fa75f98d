//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, recurring schedules and the database queries
//! - Creating, editing and deleting transactions, keeping account balances in step
//! - The transaction table view model and its HTML rendering
//! - The page for creating and editing transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form_page;
mod table;
mod view;

pub use self::core::{
    Recurrence, RecurringInterval, Transaction, TransactionId, TransactionType,
    create_transaction_table, get_transaction, list_account_transactions,
    list_dashboard_transactions, map_transaction_row, next_recurring_date, signed_amount,
};
pub use create_endpoint::{
    NewTransaction, create_transaction, create_transaction_endpoint, parse_amount,
};
pub use delete_endpoint::{
    bulk_delete_transactions, bulk_delete_transactions_api_endpoint,
    bulk_delete_transactions_endpoint, delete_transaction_endpoint,
};
pub use edit_endpoint::{edit_transaction_endpoint, update_transaction};
pub use form_page::get_transaction_form_page;
pub use table::{
    BulkDeleteRequest, RecurringFilter, SortConfig, SortDirection, SortField, TableQuery,
    TransactionTable,
};
pub(crate) use view::{edit_transaction_url, transaction_table_view};

#[cfg(test)]
pub use self::core::count_transactions;
