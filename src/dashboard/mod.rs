//! The dashboard: account cards, this month's totals and recent transactions.

mod aggregation;
mod cards;
mod handlers;
mod tables;

pub use handlers::{get_dashboard_page, list_dashboard_transactions_api_endpoint};
