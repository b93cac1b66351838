//! The page for editing an existing transaction.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    category::get_all_categories,
    database_id::TransactionId,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserId,
};

use super::{
    core::get_transaction,
    form::{FormAction, TransactionFormData, ValidationErrors, transaction_form},
    view::TransactionState,
};

/// Display the page for editing the transaction with the ID in the path.
///
/// Requesting a transaction that does not exist or belongs to another user
/// renders the not-found page.
pub async fn get_edit_transaction_page(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    let transaction = match get_transaction(transaction_id, user_id, &connection) {
        Ok(transaction) => transaction,
        Err(error) => return error.into_response(),
    };

    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Edit transaction" }

            div id="transaction-block"
            {
                (transaction_form(
                    FormAction::Edit(transaction.id),
                    &categories,
                    &TransactionFormData::from_transaction(&transaction),
                    &ValidationErrors::default(),
                ))
            }

            p class="mt-4 text-sm"
            {
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE)
                {
                    "Back to transactions"
                }
            }
        }
    };

    base("Edit transaction", &[], &content).into_response()
}

#[cfg(test)]
mod edit_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::{UserId, create_user},
    };

    use super::{TransactionState, get_edit_transaction_page};

    fn get_test_state() -> (TransactionState, UserId, i64) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user("ava@example.com", "not a real hash", &conn).unwrap();
        let category = create_category(CategoryName::new_unchecked("Groceries"), &conn).unwrap();
        let transaction = create_transaction(
            NewTransaction {
                user_id: user.id,
                category_id: category.id,
                amount: 42.00,
                date: date!(2024 - 03 - 15),
                kind: TransactionType::Expense,
            },
            &conn,
        )
        .unwrap();

        (
            TransactionState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
            transaction.id,
        )
    }

    #[tokio::test]
    async fn form_is_prefilled_with_the_transaction() {
        let (state, user_id, transaction_id) = get_test_state();

        let response =
            get_edit_transaction_page(State(state), Extension(user_id), Path(transaction_id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        let html = Html::parse_document(&body);

        let amount_selector = Selector::parse("input[name=amount]").unwrap();
        let amount_input = html.select(&amount_selector).next().unwrap();
        assert_eq!(amount_input.value().attr("value"), Some("42.00"));

        let date_selector = Selector::parse("input[name=date]").unwrap();
        let date_input = html.select(&date_selector).next().unwrap();
        assert_eq!(date_input.value().attr("value"), Some("2024-03-15"));
    }

    #[tokio::test]
    async fn other_users_transactions_are_not_found() {
        let (state, _, transaction_id) = get_test_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            create_user("noor@example.com", "not a real hash", &connection)
                .unwrap()
                .id
        };

        let response =
            get_edit_transaction_page(State(state), Extension(other_user), Path(transaction_id))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
