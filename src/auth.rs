//! Cookie-based session handling and the middleware that guards routes.
//!
//! A logged-in user is identified by a private (signed + encrypted) cookie
//! holding their user ID. The auth middleware validates the cookie, inserts
//! the [UserId] as a request extension, and redirects unauthenticated
//! requests to the log-in page.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use axum_htmx::HxRedirect;
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, endpoints, user::UserId};

pub(crate) const COOKIE_USER_ID: &str = "user_id";

/// The default duration for which auth cookies are valid.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in
/// and authenticated.
///
/// Sets the expiry of the cookie to `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserId,
    duration: Duration,
) -> PrivateCookieJar {
    let expiry = OffsetDateTime::now_utc() + duration;

    jar.add(
        Cookie::build((COOKIE_USER_ID, user_id.as_i64().to_string()))
            .path("/")
            .expires(expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which
/// should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the ID of the logged-in user from the cookie jar.
///
/// # Errors
/// Returns [Error::CookieMissing] if the auth cookie is absent or does not
/// hold a valid user ID.
pub(crate) fn get_user_id_from_cookies(jar: &PrivateCookieJar) -> Result<UserId, Error> {
    jar.get(COOKIE_USER_ID)
        .and_then(|cookie| cookie.value().parse::<i64>().ok())
        .map(UserId::new)
        .ok_or(Error::CookieMissing)
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn() -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect();
        }
    };
    let user_id = match get_user_id_from_cookies(&jar) {
        Ok(user_id) => user_id,
        Err(_) => return get_redirect(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

/// Middleware function that checks for a valid auth cookie.
///
/// The user ID is placed into the request and then the request executed
/// normally if the cookie is valid, otherwise a redirect to the log-in page
/// is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, || {
        Redirect::to(endpoints::LOG_IN_VIEW).into_response()
    })
    .await
}

/// Middleware function that checks for a valid auth cookie.
///
/// Same as [auth_guard], but unauthenticated requests get an HTMX redirect
/// to the log-in page so that in-page requests trigger a full navigation.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, || {
        (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::OK,
        )
            .into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::State,
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use axum_htmx::HX_REDIRECT;
    use axum_test::TestServer;
    use sha2::Digest;

    use crate::{endpoints, user::UserId};

    use super::{
        AuthState, COOKIE_USER_ID, DEFAULT_COOKIE_DURATION, auth_guard, auth_guard_hx,
        set_auth_cookie,
    };

    async fn test_handler(Extension(user_id): Extension<UserId>) -> Html<String> {
        Html(format!("<h1>Hello, user {user_id}!</h1>"))
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> PrivateCookieJar {
        set_auth_cookie(jar, UserId::new(1), state.cookie_duration)
    }

    const TEST_LOG_IN_ROUTE: &str = "/log_in_stub";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    fn get_test_state() -> AuthState {
        let hash = sha2::Sha512::digest("nafstenoas");

        AuthState {
            cookie_key: Key::from(&hash),
            cookie_duration: DEFAULT_COOKIE_DURATION,
        }
    }

    fn get_test_server() -> TestServer {
        let state = get_test_state();

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let server = get_test_server();
        let response = server.post(TEST_LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let auth_cookie = response.cookie(COOKIE_USER_ID);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text_contains("Hello, user 1!");
    }

    #[tokio::test]
    async fn get_protected_route_with_no_auth_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn hx_guard_returns_hx_redirect_header() {
        let state = get_test_state();
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx))
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_ok();
        assert_eq!(response.header(HX_REDIRECT), endpoints::LOG_IN_VIEW);
    }
}
