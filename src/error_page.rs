//! Full-page responses for errors that end a page request: 401, 404 and 500.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// A full HTML error page.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPage<'a> {
    /// The request did not carry an authenticated identity.
    Unauthorized,
    /// The route or resource does not exist.
    NotFound,
    /// Something failed on the server.
    ///
    /// `description` says what went wrong, `fix` tells the user what to do next.
    InternalServerError { description: &'a str, fix: &'a str },
}

impl ErrorPage<'_> {
    /// The default 500 page, for errors whose details should stay in the server logs.
    pub fn internal_server_error() -> Self {
        ErrorPage::InternalServerError {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ErrorPage::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorPage::NotFound => StatusCode::NOT_FOUND,
            ErrorPage::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_html(self) -> Html<String> {
        let markup = match self {
            ErrorPage::Unauthorized => error_view(
                "Unauthorized",
                "401",
                "You are not signed in.",
                "Sign in through your identity provider and reload this page.",
            ),
            ErrorPage::NotFound => error_view(
                "Not Found",
                "404",
                "Something's missing.",
                "Sorry, we can't find that page. You'll find lots to explore on the dashboard.",
            ),
            ErrorPage::InternalServerError { description, fix } => {
                error_view("Internal Server Error", "500", description, fix)
            }
        };

        Html(markup.into_string())
    }
}

impl IntoResponse for ErrorPage<'_> {
    fn into_response(self) -> Response {
        (self.status_code(), self.into_html()).into_response()
    }
}

/// The fallback route handler for paths that do not match any route.
pub async fn get_404_not_found() -> Response {
    ErrorPage::NotFound.into_response()
}

/// The route handler for the generic 500 page.
pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::internal_server_error().into_response()
}
