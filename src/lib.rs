//! Finzo is a web app for tracking money across accounts.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! small JSON API under `/api/v1`.
//!
//! Users are identified by an upstream identity-aware proxy, see
//! [DEFAULT_IDENTITY_HEADER].

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod error_page;
mod html;
mod identity;
mod logging;
mod navigation;
mod routing;
mod timezone;
mod transaction;
mod transport;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{AccountType, NewAccount, create_account};
pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use identity::{DEFAULT_IDENTITY_HEADER, Principal};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{NewTransaction, RecurringInterval, TransactionType, create_transaction};
pub use user::ensure_user;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
