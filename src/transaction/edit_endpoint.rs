//! The route handler for updating an existing transaction.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::{HxReswap, HxRetarget, SwapOption};
use maud::html;

use crate::{
    Error,
    alert::{AlertKind, alert},
    category::{Category, get_all_categories},
    database_id::TransactionId,
    user::UserId,
};

use super::{
    core::{Transaction, update_transaction},
    form::{FieldError, FormAction, TransactionFormData, ValidationErrors, transaction_form},
    view::TransactionState,
};

/// A route handler for updating the transaction with the ID in the path.
///
/// A valid submission overwrites the transaction and returns a confirmation
/// followed by the form with the saved values. An invalid submission returns
/// the form re-rendered with error messages, retargeted at the form itself.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
    Form(form_data): Form<TransactionFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_alert_response();
        }
    };

    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_alert_response(),
    };

    let validated = match form_data.validate() {
        Ok(validated) => validated,
        Err(errors) => return rerender_form(transaction_id, &categories, &form_data, &errors),
    };

    let transaction = Transaction {
        id: transaction_id,
        user_id,
        category_id: validated.category_id,
        amount: validated.amount,
        date: validated.date,
        kind: validated.kind,
    };

    let result = update_transaction(&transaction, &connection);
    drop(connection);

    match result {
        Ok(()) => {}
        Err(Error::InvalidCategory(_)) => {
            let errors = ValidationErrors {
                category: Some(FieldError::UnknownCategory),
                ..Default::default()
            };
            return rerender_form(transaction_id, &categories, &form_data, &errors);
        }
        Err(error) => return error.into_alert_response(),
    }

    let body = html! {
        (alert(AlertKind::Success, "Transaction saved.", ""))
        (transaction_form(
            FormAction::Edit(transaction_id),
            &categories,
            &TransactionFormData::from_transaction(&transaction),
            &ValidationErrors::default(),
        ))
    };

    (StatusCode::OK, body).into_response()
}

fn rerender_form(
    transaction_id: TransactionId,
    categories: &[Category],
    values: &TransactionFormData,
    errors: &ValidationErrors,
) -> Response {
    (
        StatusCode::OK,
        HxRetarget("#transaction-form".to_owned()),
        HxReswap(SwapOption::OuterHtml),
        transaction_form(FormAction::Edit(transaction_id), categories, values, errors),
    )
        .into_response()
}
