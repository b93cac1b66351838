//! The route handler for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{Error, database_id::TransactionId, user::UserId};

use super::{core::delete_transaction, view::TransactionState};

/// A route handler for deleting the transaction with the ID in the path.
///
/// The delete buttons in the transactions table swap the response over the
/// deleted row, so a successful delete returns an empty body.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, user_id, &connection) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => error.into_alert_response(),
    }
}
