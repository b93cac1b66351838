//! The page for creating a new transaction.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    category::get_all_categories,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

use super::{
    form::{FormAction, TransactionFormData, ValidationErrors, transaction_form},
    view::TransactionState,
};

/// Display the page for creating a new transaction.
///
/// Submissions swap their result into the block around the form, so a
/// successful create shows a confirmation and an empty form without leaving
/// the page.
pub async fn get_new_transaction_page(State(state): State<TransactionState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let content = html! {
        (NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Add transaction" }

            div id="transaction-block"
            {
                (transaction_form(
                    FormAction::Create,
                    &categories,
                    &TransactionFormData::default(),
                    &ValidationErrors::default(),
                ))
            }

            p class="mt-4 text-sm"
            {
                "Missing a category? "
                a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Create one" }
            }
        }
    };

    base("Add transaction", &[], &content).into_response()
}

#[cfg(test)]
mod new_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
    };

    use super::{TransactionState, get_new_transaction_page};

    #[tokio::test]
    async fn renders_form_inside_swap_block() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_category(CategoryName::new_unchecked("Groceries"), &conn).unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_new_transaction_page(State(state)).await;
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();

        let html = Html::parse_document(&body);
        let form_selector = Selector::parse("#transaction-block form#transaction-form").unwrap();
        assert!(html.select(&form_selector).next().is_some());
    }
}
