//! The route handler for creating transactions.

use axum::{
    Extension,
    extract::State,
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
    user::UserId,
};

use super::{
    core::NewTransaction,
    create_transaction,
    form::{FieldError, FormAction, TransactionFormData, ValidationErrors, transaction_form},
    view::TransactionState,
};

/// A route handler for creating a new transaction.
///
/// A valid submission inserts the transaction and returns a confirmation
/// followed by an empty form, which the client swaps into the form's
/// surrounding block. An invalid submission returns the form re-rendered with
/// error messages, retargeted at the form itself so the rest of the page is
/// left alone.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
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
        Err(errors) => return rerender_form(&categories, &form_data, &errors),
    };

    let result = create_transaction(
        NewTransaction {
            user_id,
            category_id: validated.category_id,
            amount: validated.amount,
            date: validated.date,
            kind: validated.kind,
        },
        &connection,
    );
    drop(connection);

    match result {
        Ok(_) => {}
        Err(Error::InvalidCategory(_)) => {
            let errors = ValidationErrors {
                category: Some(FieldError::UnknownCategory),
                ..Default::default()
            };
            return rerender_form(&categories, &form_data, &errors);
        }
        Err(error) => return error.into_alert_response(),
    }

    let body = html! {
        (alert(AlertKind::Success, "Transaction added.", ""))
        (transaction_form(
            FormAction::Create,
            &categories,
            &TransactionFormData::default(),
            &ValidationErrors::default(),
        ))
    };

    (StatusCode::CREATED, body).into_response()
}

/// Re-render the form with error messages in place of the submitted form.
///
/// The response retargets the swap from the surrounding block to the form
/// element itself. The status is 200 because the client only swaps
/// successful responses.
fn rerender_form(
    categories: &[Category],
    values: &TransactionFormData,
    errors: &ValidationErrors,
) -> Response {
    (
        StatusCode::OK,
        HxRetarget("#transaction-form".to_owned()),
        HxReswap(SwapOption::OuterHtml),
        transaction_form(FormAction::Create, categories, values, errors),
    )
        .into_response()
}
