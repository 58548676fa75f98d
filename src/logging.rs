//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::identity::IdentityState;

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level with the
/// identity header redacted.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(
    State(state): State<IdentityState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let Some(body_text) = read_body_text(body).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    log_request(&parts, &state, &body_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let Some(body_text) = read_body_text(body).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

async fn read_body_text(body: Body) -> Option<String> {
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).to_string()),
        Err(error) => {
            tracing::error!("Could not read body for logging: {error}");
            None
        }
    }
}

/// A copy of `headers` with the identity header value replaced.
fn redact_identity(headers: &HeaderMap, state: &IdentityState) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(&state.identity_header) {
        headers.insert(
            state.identity_header.clone(),
            HeaderValue::from_static(REDACTED),
        );
    }

    headers
}

/// Cut `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate(body: &str) -> Option<&str> {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return None;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    Some(&body[..end])
}

fn log_request(parts: &request::Parts, state: &IdentityState, body: &str) {
    let method = &parts.method;
    let uri = &parts.uri;
    let headers = redact_identity(&parts.headers, state);

    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {method} {uri} {headers:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {method} {uri} {headers:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    let status = parts.status;
    let headers = &parts.headers;

    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {status} {headers:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {status} {headers:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;

    use crate::{
        identity::{DEFAULT_IDENTITY_HEADER, IdentityState},
        logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_identity, truncate},
    };

    fn state() -> IdentityState {
        IdentityState {
            identity_header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
        }
    }

    #[test]
    fn redacts_identity_header() {
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_IDENTITY_HEADER, HeaderValue::from_static("alice"));
        headers.insert("accept", HeaderValue::from_static("text/html"));

        let redacted = redact_identity(&headers, &state());

        assert_eq!(redacted.get(DEFAULT_IDENTITY_HEADER).unwrap(), "********");
        assert_eq!(redacted.get("accept").unwrap(), "text/html");
        assert_eq!(headers.get(DEFAULT_IDENTITY_HEADER).unwrap(), "alice");
    }

    #[test]
    fn truncates_long_bodies_on_char_boundary() {
        assert_eq!(truncate("short"), None);

        let body = format!("{}é", "a".repeat(LOG_BODY_LENGTH_LIMIT - 1));
        let truncated = truncate(&body).unwrap();

        assert_eq!(truncated.len(), LOG_BODY_LENGTH_LIMIT - 1);
    }

    #[tokio::test]
    async fn passes_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn_with_state(state(), logging_middleware));
        let server = TestServer::new(app);

        let response = server.post("/echo").text("name=Everyday&balance=10").await;

        response.assert_status(StatusCode::OK);
        response.assert_text("name=Everyday&balance=10");
    }
}
