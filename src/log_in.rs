//! The log-in page and the handler for log-in requests.
//!
//! The auth module handles the lower level cookie logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::{
    Form, PrivateCookieJar,
    cookie::Key,
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::set_auth_cookie,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    user::{User, get_user_by_email},
};

const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
}

fn log_in_view(email: Option<&str>, error_message: Option<&str>) -> Markup {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Log in" }

            form
                action=(endpoints::LOG_IN_API)
                method="post"
                class="w-full max-w-md space-y-4"
            {
                div
                {
                    label for="email" class=(FORM_LABEL_STYLE) { "Email" }
                    input
                        name="email"
                        id="email"
                        type="email"
                        value=[email]
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="password" class=(FORM_LABEL_STYLE) { "Password" }
                    input
                        name="password"
                        id="password"
                        type="password"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                @if let Some(error_message) = error_message {
                    p class=(FORM_ERROR_STYLE) { (error_message) }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Log in" }
            }

            p class="mt-4 text-sm"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "Register" }
            }
        }
    };

    base("Log in", &[], &content)
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Markup {
    log_in_view(None, None)
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the transactions page. Otherwise, the form is returned with
/// an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    let user: User = match get_user_by_email(&user_data.email, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return (
                StatusCode::UNAUTHORIZED,
                log_in_view(Some(&user_data.email), Some(INVALID_CREDENTIALS_ERROR_MSG)),
            )
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return error.into_response();
        }
    };
    drop(connection);

    let is_password_valid = match bcrypt::verify(&user_data.password, &user.password_hash) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    };

    if !is_password_valid {
        return (
            StatusCode::UNAUTHORIZED,
            log_in_view(Some(&user_data.email), Some(INVALID_CREDENTIALS_ERROR_MSG)),
        )
            .into_response();
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration);

    (jar, Redirect::to(endpoints::TRANSACTIONS_VIEW)).into_response()
}
