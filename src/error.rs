//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, error_page::ErrorPage};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry an authenticated identity.
    #[error("Unauthorized")]
    Unauthorized,

    /// The text given as an account balance could not be parsed as a decimal number.
    #[error("Invalid balance amount \"{0}\"")]
    InvalidBalance(String),

    /// The text given as a transaction amount is not a positive decimal number.
    #[error("Invalid transaction amount \"{0}\"")]
    InvalidAmount(String),

    /// An empty string was used as an account name.
    #[error("Account name cannot be empty")]
    EmptyAccountName,

    /// The category key does not exist or does not match the transaction type.
    #[error("\"{0}\" is not a valid category for this transaction")]
    InvalidCategory(String),

    /// A recurring transaction was submitted without a recurring interval.
    #[error("Recurring transactions need a recurring interval")]
    MissingRecurringInterval,

    /// A JSON request body was malformed or did not match the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// A bulk action was requested with no rows selected.
    #[error("No transactions were selected")]
    EmptySelection,

    /// Storage refused to mark a second account as default for the same user.
    #[error("the user already has a default account")]
    DefaultAccountConflict,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Only the partial index on default accounts is unique per user.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("account.user_id") =>
            {
                Error::DefaultAccountConflict
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => ErrorPage::NotFound.into_response(),
            Error::Unauthorized => ErrorPage::Unauthorized.into_response(),
            Error::InvalidTimezoneError(timezone) => ErrorPage::InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => ErrorPage::internal_server_error().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::internal_server_error().into_response()
            }
        }
    }
}

impl Error {
    /// The HTTP status code that best describes the error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::InvalidBalance(_)
            | Error::InvalidAmount(_)
            | Error::EmptyAccountName
            | Error::InvalidCategory(_)
            | Error::MissingRecurringInterval
            | Error::InvalidRequestBody(_)
            | Error::EmptySelection => StatusCode::BAD_REQUEST,
            Error::DefaultAccountConflict => StatusCode::CONFLICT,
            Error::NotFound
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingTransaction
            | Error::UpdateMissingAccount => StatusCode::NOT_FOUND,
            Error::SqlError(_) | Error::InvalidTimezoneError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();
        let alert = match self {
            Error::Unauthorized => Alert::Error {
                message: "Unauthorized".to_owned(),
                details: "Sign in again and retry.".to_owned(),
            },
            Error::InvalidBalance(_)
            | Error::InvalidAmount(_)
            | Error::EmptyAccountName
            | Error::InvalidCategory(_)
            | Error::MissingRecurringInterval
            | Error::InvalidRequestBody(_)
            | Error::EmptySelection => Alert::Error {
                message: "Invalid input".to_owned(),
                details: self.to_string(),
            },
            Error::DefaultAccountConflict => Alert::Error {
                message: "Could not change the default account".to_owned(),
                details: "Another request changed your default account at the same time. \
                    Refresh the page and try again."
                    .to_owned(),
            },
            Error::NotFound => Alert::Error {
                message: "Not found".to_owned(),
                details: "The requested item could not be found.".to_owned(),
            },
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            },
            Error::UpdateMissingTransaction => Alert::Error {
                message: "Could not update transaction".to_owned(),
                details: "The transaction could not be found.".to_owned(),
            },
            Error::DeleteMissingTransaction => Alert::Error {
                message: "Could not delete transaction".to_owned(),
                details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            },
            Error::UpdateMissingAccount => Alert::Error {
                message: "Could not update account".to_owned(),
                details: "The account could not be found.".to_owned(),
            },
            Error::SqlError(_) | Error::DatabaseLockError => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            },
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rusqlite::Connection;

    use super::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn unique_default_index_violation_maps_to_conflict() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE account (id INTEGER PRIMARY KEY, user_id INTEGER, is_default INTEGER);
                CREATE UNIQUE INDEX idx_account_default ON account(user_id) WHERE is_default = 1;
                INSERT INTO account (user_id, is_default) VALUES (1, 1);",
            )
            .unwrap();

        let error = connection
            .execute(
                "INSERT INTO account (user_id, is_default) VALUES (1, 1)",
                (),
            )
            .unwrap_err();

        assert_eq!(Error::from(error), Error::DefaultAccountConflict);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = Error::InvalidBalance("abc".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
