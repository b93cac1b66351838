//! The 404 page and its route handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// The fallback route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Get a 404 response with the not-found page as its body.
pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "The page you are looking for does not exist.",
            "Check the URL or head back to the transactions page.",
        ),
    )
        .into_response()
}
