//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx},
    category::{create_category_endpoint, get_new_category_page},
    charts_page::get_charts_page,
    endpoints,
    html::error_view,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    register_user::{get_register_page, register_user},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_page,
        get_new_transaction_page, get_transactions_page, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::CHARTS_VIEW, get(get_charts_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-Redirect header for
    // auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}

/// Get a 500 response with the internal server error page as its body.
pub(crate) fn render_internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_view(
            "Error",
            "500",
            "Something went wrong on our end.",
            "Try again in a few minutes.",
        ),
    )
        .into_response()
}

/// Display the internal server error page.
async fn get_internal_server_error_page() -> Response {
    render_internal_server_error()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_htmx::HX_REDIRECT;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, endpoints};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, "a secret").unwrap();

        TestServer::try_new(build_router(state)).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_page_request_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS_VIEW).await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::LOG_IN_VIEW
        );
    }

    #[tokio::test]
    async fn unauthenticated_hx_request_gets_hx_redirect() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_header("HX-Request", "true")
            .await;

        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::LOG_IN_VIEW
        );
    }

    #[tokio::test]
    async fn root_redirects_to_transactions_once_logged_in() {
        let server = get_test_server();

        server
            .post(endpoints::USERS)
            .form(&[("email", "ava@example.com"), ("password", "hunter2hunter2")])
            .await;
        let auth_cookie = {
            let response = server
                .post(endpoints::LOG_IN_API)
                .form(&[("email", "ava@example.com"), ("password", "hunter2hunter2")])
                .await;
            response.cookie(crate::auth::COOKIE_USER_ID)
        };

        let response = server
            .get(endpoints::ROOT)
            .add_cookie(auth_cookie)
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::TRANSACTIONS_VIEW
        );
    }

    #[tokio::test]
    async fn unknown_path_renders_not_found_page() {
        let server = get_test_server();

        let response = server.get("/no/such/page").await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn log_in_page_is_reachable_without_auth() {
        let server = get_test_server();

        let response = server.get(endpoints::LOG_IN_VIEW).await;

        assert_eq!(response.status_code(), StatusCode::OK);
    }
}
