//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/users/:user_id', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page listing the user's accounts and recent transactions.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page showing one account and its transaction table.
pub const ACCOUNT_VIEW: &str = "/accounts/{account_id}";
/// The page for creating a new transaction, or editing one with `?edit={id}`.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create accounts from the dashboard form.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to make an account the user's default account.
pub const DEFAULT_ACCOUNT: &str = "/api/accounts/{account_id}/default";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete the rows selected in the transaction table.
pub const BULK_DELETE_TRANSACTIONS: &str = "/api/transactions/bulk_delete";

/// The JSON route to list and create accounts.
pub const API_V1_ACCOUNTS: &str = "/api/v1/accounts";
/// The JSON route to list the transactions shown on the dashboard.
pub const API_V1_DASHBOARD_TRANSACTIONS: &str = "/api/v1/dashboard/transactions";
/// The JSON route to delete several transactions at once.
pub const API_V1_BULK_DELETE: &str = "/api/v1/transactions/bulk_delete";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
