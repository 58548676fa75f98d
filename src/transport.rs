//! The JSON shapes sent to API clients.
//!
//! Money is kept as [Decimal] everywhere inside the server. It is only turned
//! into a plain number here, when a record leaves the server as JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, AccountSummary, AccountType},
    transaction::{RecurringInterval, Transaction, TransactionId, TransactionType},
};

/// Convert a fixed-point currency amount into a number that JSON clients can use.
///
/// Amounts outside the range of an `f64` cannot be stored by the application,
/// so the fallback of zero is never reached in practice.
pub fn decimal_to_number(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

/// An account as sent to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    pub id: AccountId,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: f64,
    pub is_default: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub transaction_count: i64,
}

impl From<&AccountSummary> for AccountPayload {
    fn from(summary: &AccountSummary) -> Self {
        let account = &summary.account;

        Self {
            id: account.id,
            name: account.name.clone(),
            account_type: account.account_type,
            balance: decimal_to_number(account.balance),
            is_default: account.is_default,
            created_at: account.created_at,
            transaction_count: summary.transaction_count,
        }
    }
}

/// A transaction as sent to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub id: TransactionId,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Always positive, the direction is given by `type`.
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: Date,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub next_recurring_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Transaction> for TransactionPayload {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            account_id: transaction.account_id,
            transaction_type: transaction.transaction_type,
            amount: decimal_to_number(transaction.amount),
            category: transaction.category.clone(),
            description: transaction.description.clone(),
            date: transaction.date,
            is_recurring: transaction.is_recurring(),
            recurring_interval: transaction
                .recurrence
                .as_ref()
                .map(|recurrence| recurrence.interval),
            next_recurring_date: transaction
                .recurrence
                .as_ref()
                .map(|recurrence| recurrence.next_date),
            created_at: transaction.created_at,
        }
    }
}

/// The outcome of a write operation, serialised as either
/// `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.
///
/// `success` is the discriminant clients check, the HTTP status is only a hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failed result with a message that is safe to show to the client.
    pub fn failure(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(client_message(error)),
        }
    }

    /// Wrap the result of a write operation, logging the error on failure.
    ///
    /// `action` describes the operation for the log, e.g. "create account".
    pub fn from_result(result: Result<T, Error>, action: &str) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => {
                tracing::error!("Could not {action}: {error}");
                Self::failure(&error)
            }
        }
    }
}

/// Respond to a JSON write request with an [ActionResult].
///
/// On failure the status code is taken from the error, see [Error::status_code].
pub fn action_response<T: Serialize>(result: Result<T, Error>, action: &str) -> Response {
    let status_code = match &result {
        Ok(_) => StatusCode::OK,
        Err(error) => error.status_code(),
    };

    (status_code, Json(ActionResult::from_result(result, action))).into_response()
}

/// Storage internals are logged on the server and replaced with a generic message.
fn client_message(error: &Error) -> String {
    match error {
        Error::SqlError(_) | Error::DatabaseLockError => {
            "An unexpected error occurred, try again later.".to_owned()
        }
        error => error.to_string(),
    }
}

/// Unwrap the result of a read operation, logging the error and falling back
/// to an empty list on failure.
///
/// `what` names the data being read for the log, e.g. "accounts".
pub fn or_empty<T>(result: Result<Vec<T>, Error>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|error| {
        tracing::error!("Could not get {what}, showing an empty list instead: {error}");
        Vec::new()
    })
}
