//! Identity middleware that turns the subject ID forwarded by the upstream identity
//! provider into a [Principal] for route handlers.
//!
//! Sign-in happens outside of this application: an identity-aware reverse proxy
//! authenticates the user and forwards their subject ID in a request header.
//! Handlers never read that header themselves, they receive the [Principal]
//! extension inserted here and pass it explicitly to the data layer.

use std::fmt::Display;

use axum::{
    Json,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AppState, Error, error_page::ErrorPage, transport::ActionResult};

/// The header used when none is configured, as set by oauth2-proxy.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-auth-request-user";

/// The authenticated subject ID issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    /// Wrap a subject ID.
    ///
    /// The caller must only construct a principal from a value that the
    /// identity provider has authenticated.
    pub fn new(subject: &str) -> Self {
        Self(subject.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The state needed for the identity middleware.
#[derive(Debug, Clone)]
pub struct IdentityState {
    /// The request header carrying the authenticated subject ID.
    pub identity_header: HeaderName,
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            identity_header: state.identity_header.clone(),
        }
    }
}

/// Read the principal from `request`.
///
/// Returns `None` if the header is missing, is not valid UTF-8, or is blank.
fn get_principal(request: &Request, identity_header: &HeaderName) -> Option<Principal> {
    let subject = request.headers().get(identity_header)?.to_str().ok()?.trim();

    if subject.is_empty() {
        None
    } else {
        Some(Principal::new(subject))
    }
}

#[inline]
async fn identity_guard_internal(
    state: IdentityState,
    mut request: Request,
    next: Next,
    get_rejection: impl Fn() -> Response,
) -> Response {
    let Some(principal) = get_principal(&request, &state.identity_header) else {
        tracing::warn!(
            "Rejected request to {} without an identity in the {} header",
            request.uri().path(),
            state.identity_header
        );
        return get_rejection();
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Middleware function that checks for an authenticated identity.
/// The [Principal] is placed into the request and the request executed normally if present,
/// otherwise the 401 error page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(principal): Extension<Principal>` to receive the principal.
pub async fn identity_guard(
    State(state): State<IdentityState>,
    request: Request,
    next: Next,
) -> Response {
    identity_guard_internal(state, request, next, || {
        ErrorPage::Unauthorized.into_response()
    })
    .await
}

/// Middleware function that checks for an authenticated identity.
/// The [Principal] is placed into the request and the request executed normally if present,
/// otherwise an HTML alert is returned for htmx to display.
pub async fn identity_guard_hx(
    State(state): State<IdentityState>,
    request: Request,
    next: Next,
) -> Response {
    identity_guard_internal(state, request, next, || {
        Error::Unauthorized.into_alert_response()
    })
    .await
}

/// Middleware function that checks for an authenticated identity.
/// The [Principal] is placed into the request and the request executed normally if present,
/// otherwise a JSON failure result is returned.
pub async fn identity_guard_json(
    State(state): State<IdentityState>,
    request: Request,
    next: Next,
) -> Response {
    identity_guard_internal(state, request, next, || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ActionResult::<()>::failure(&Error::Unauthorized)),
        )
            .into_response()
    })
    .await
}
