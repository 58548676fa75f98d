//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as an out-of-band htmx swap into the alert container
//! defined in [crate::html::base], so any htmx response can carry one.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// A message shown to the user after an action completes or fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with extra details.
    Error { message: String, details: String },
}

impl Alert {
    fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. })
    }

    fn message(&self) -> &str {
        match self {
            Alert::SuccessSimple { message } | Alert::Error { message, .. } => message,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Alert::Error { details, .. } => Some(details),
            Alert::SuccessSimple { .. } => None,
        }
    }

    fn into_markup(self) -> Markup {
        let style = if self.is_error() {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400 shadow-lg"
        } else {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400 shadow-lg"
        };
        let role = if self.is_error() { "alert" } else { "status" };

        html!(
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    class=(style)
                    role=(role)
                    onclick="this.parentElement.classList.add('hidden')"
                {
                    span class="font-medium" { (self.message()) }

                    @if let Some(details) = self.details() {
                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }
                }
            }
        )
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_has_alert_role_and_details() {
        let alert = Alert::Error {
            message: "Could not create account".to_owned(),
            details: "Invalid balance".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        let div = html
            .select(&Selector::parse("div[role='alert']").unwrap())
            .next()
            .expect("no alert div found");
        let text = div.text().collect::<String>();
        assert!(text.contains("Could not create account"));
        assert!(text.contains("Invalid balance"));
    }

    #[test]
    fn simple_success_alert_has_no_details_paragraph() {
        let alert = Alert::SuccessSimple {
            message: "Transactions deleted".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        assert!(
            html.select(&Selector::parse("div[role='status']").unwrap())
                .next()
                .is_some()
        );
        assert!(html.select(&Selector::parse("p").unwrap()).next().is_none());
    }
}
