//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_api_endpoint, create_account_endpoint, get_account_page,
        list_accounts_api_endpoint, set_default_account_endpoint,
    },
    dashboard::{get_dashboard_page, list_dashboard_transactions_api_endpoint},
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    identity::{identity_guard, identity_guard_hx, identity_guard_json},
    transaction::{
        bulk_delete_transactions_api_endpoint, bulk_delete_transactions_endpoint,
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_form_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(
        endpoints::INTERNAL_ERROR_VIEW,
        get(get_internal_server_error_page),
    );

    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ACCOUNT_VIEW, get(get_account_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_transaction_form_page),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity_guard,
        ));

    // Requests from htmx need an alert fragment rather than an error page when rejected.
    let htmx_routes = Router::new()
        .route(endpoints::ACCOUNTS_API, post(create_account_endpoint))
        .route(
            endpoints::DEFAULT_ACCOUNT,
            put(set_default_account_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BULK_DELETE_TRANSACTIONS,
            post(bulk_delete_transactions_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity_guard_hx,
        ));

    let json_routes = Router::new()
        .route(
            endpoints::API_V1_ACCOUNTS,
            get(list_accounts_api_endpoint).post(create_account_api_endpoint),
        )
        .route(
            endpoints::API_V1_DASHBOARD_TRANSACTIONS,
            get(list_dashboard_transactions_api_endpoint),
        )
        .route(
            endpoints::API_V1_BULK_DELETE,
            post(bulk_delete_transactions_api_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity_guard_json,
        ));

    page_routes
        .merge(htmx_routes)
        .merge(json_routes)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}
