//! The registration page and the handler for creating new users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
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
    user::create_user,
};

const MIN_PASSWORD_LENGTH: usize = 8;

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegisterState> for Key {
    fn from_ref(state: &RegisterState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for a registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    /// The email address to register with.
    pub email: String,
    /// The password to register with.
    pub password: String,
}

fn register_view(email: Option<&str>, error_message: Option<&str>) -> Markup {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Register" }

            form
                action=(endpoints::USERS)
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
                        minlength=(MIN_PASSWORD_LENGTH)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                @if let Some(error_message) = error_message {
                    p class=(FORM_ERROR_STYLE) { (error_message) }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Register" }
            }

            p class="mt-4 text-sm"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in" }
            }
        }
    };

    base("Register", &[], &content)
}

/// Display the registration page.
pub async fn get_register_page() -> Markup {
    register_view(None, None)
}

/// Handler for registration requests via the POST method.
///
/// On success the user is created, logged in, and redirected to the
/// transactions page. Otherwise, the form is returned with an error message.
pub async fn register_user(
    State(state): State<RegisterState>,
    jar: PrivateCookieJar,
    Form(register_data): Form<RegisterData>,
) -> Response {
    if !register_data.email.contains('@') {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            register_view(
                Some(&register_data.email),
                Some("Enter a valid email address."),
            ),
        )
            .into_response();
    }

    if register_data.password.chars().count() < MIN_PASSWORD_LENGTH {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            register_view(
                Some(&register_data.email),
                Some("Passwords must be at least 8 characters long."),
            ),
        )
            .into_response();
    }

    let password_hash = match bcrypt::hash(&register_data.password, bcrypt::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            tracing::error!("could not hash password: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    let user = match create_user(&register_data.email, &password_hash, &connection) {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                register_view(
                    Some(&register_data.email),
                    Some("That email address is already registered."),
                ),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration);

    (jar, Redirect::to(endpoints::TRANSACTIONS_VIEW)).into_response()
}
