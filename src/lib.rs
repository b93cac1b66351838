//! Penny is a web app for tracking personal income and expenses.
//!
//! Users log transactions (income or expense, with an amount, date, and
//! category), browse them with type/date/category filters, and view
//! aggregate totals and charts. The server renders HTML directly; htmx is
//! used for in-page partial updates.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod charts;
mod charts_page;
mod database_id;
mod db;
mod endpoints;
mod html;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod register_user;
mod routing;
mod transaction;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use user::UserId;

use crate::{
    alert::{AlertKind, alert},
    database_id::CategoryId,
    not_found::get_404_not_found_response,
    routing::render_internal_server_error,
};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email/password combination that does not match
    /// a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The session cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// The email used to register already belongs to a user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty or blank string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The category name used to create a category already exists.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The category ID on a transaction did not match a real category.
    #[error("the category ID {0:?} does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The requested resource was not found.
    ///
    /// Rows owned by another user are reported with this error so that
    /// their existence is not leaked.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error()
            }
        }
    }
}

impl Error {
    /// Convert the error into an alert fragment response for htmx endpoints.
    pub(crate) fn into_alert_response(self) -> Response {
        match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                alert(
                    AlertKind::Error,
                    "Not found",
                    "The requested item could not be found. \
                    Try refreshing the page.",
                ),
            )
                .into_response(),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                alert(
                    AlertKind::Error,
                    "Invalid category",
                    &format!("Could not find a category with the ID {category_id:?}"),
                ),
            )
                .into_response(),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                alert(
                    AlertKind::Error,
                    "Duplicate category name",
                    &format!(
                        "The category \"{name}\" already exists. \
                        Choose a different name."
                    ),
                ),
            )
                .into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    alert(
                        AlertKind::Error,
                        "Something went wrong",
                        "An unexpected error occurred, check the server logs for more details.",
                    ),
                )
                    .into_response()
            }
        }
    }
}
