//! The transactions page: a filterable list of the user's transactions with
//! income, expense, and net totals.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
// axum's Query does not support repeated keys such as `?category=1&category=2`.
use axum_extra::extract::Query;
use axum_htmx::HxRequest;
use maud::html;

use crate::{
    Error,
    category::get_all_categories,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserId,
};

use super::{
    filter::{RawFilterQuery, TransactionFilter, fetch_transactions},
    totals::Totals,
    view::{TransactionState, filter_form, transactions_container},
};

/// Display the user's transactions, filtered by the query string parameters.
///
/// For requests made by the filter form, only the transactions container is
/// returned so the page updates in place. Full requests get the whole page.
pub async fn get_transactions_page(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    HxRequest(is_hx_request): HxRequest,
    Query(raw_query): Query<RawFilterQuery>,
) -> Response {
    let filter = TransactionFilter::from_raw(&raw_query);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    let transactions = match fetch_transactions(user_id, &filter, &connection) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let totals = Totals::from_transactions(&transactions);
    let container = transactions_container(&transactions, &categories, &totals);

    if is_hx_request {
        return container.into_response();
    }

    let query_string = filter.to_query_string();
    let charts_href = if query_string.is_empty() {
        endpoints::CHARTS_VIEW.to_owned()
    } else {
        format!("{}?{}", endpoints::CHARTS_VIEW, query_string)
    };

    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex items-baseline justify-between mb-6"
            {
                h1 class="text-2xl font-bold" { "Transactions" }
                a href=(charts_href) class=(LINK_STYLE) { "View charts" }
            }

            (filter_form(
                endpoints::TRANSACTIONS_VIEW,
                "#transactions-container",
                &categories,
                &filter,
            ))

            (container)
        }
    };

    base("Transactions", &[], &content).into_response()
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use axum_htmx::HxRequest;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::{UserId, create_user},
    };

    use super::{RawFilterQuery, TransactionState, get_transactions_page};

    async fn response_body(response: axum::response::Response) -> String {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body_bytes.to_vec()).unwrap()
    }

    fn get_test_state() -> (TransactionState, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user("ava@example.com", "not a real hash", &conn).unwrap();
        let salary = create_category(CategoryName::new_unchecked("Salary"), &conn).unwrap();
        let groceries = create_category(CategoryName::new_unchecked("Groceries"), &conn).unwrap();

        create_transaction(
            NewTransaction {
                user_id: user.id,
                category_id: salary.id,
                amount: 1000.0,
                date: date!(2024 - 01 - 01),
                kind: TransactionType::Income,
            },
            &conn,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                user_id: user.id,
                category_id: groceries.id,
                amount: 200.0,
                date: date!(2024 - 01 - 10),
                kind: TransactionType::Expense,
            },
            &conn,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                user_id: user.id,
                category_id: groceries.id,
                amount: 50.0,
                date: date!(2024 - 02 - 01),
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
        )
    }

    #[tokio::test]
    async fn full_request_renders_whole_page() {
        let (state, user_id) = get_test_state();

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            HxRequest(false),
            Query(RawFilterQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response_body(response).await;
        let html = Html::parse_document(&body);
        assert!(html.select(&Selector::parse("nav").unwrap()).next().is_some());
        assert!(
            html.select(&Selector::parse("#transactions-container").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn hx_request_renders_only_the_container() {
        let (state, user_id) = get_test_state();

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            HxRequest(true),
            Query(RawFilterQuery::default()),
        )
        .await;

        let body = response_body(response).await;
        let html = Html::parse_fragment(&body);
        assert!(html.select(&Selector::parse("nav").unwrap()).next().is_none());
        assert!(
            html.select(&Selector::parse("#transactions-container").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn date_filter_changes_the_totals() {
        let (state, user_id) = get_test_state();
        let raw_query = RawFilterQuery {
            start_date: Some("2024-01-05".to_owned()),
            ..Default::default()
        };

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            HxRequest(true),
            Query(raw_query),
        )
        .await;

        let body = response_body(response).await;
        let html = Html::parse_fragment(&body);

        let text_of = |selector: &str| -> String {
            html.select(&Selector::parse(selector).unwrap())
                .next()
                .unwrap()
                .text()
                .collect::<String>()
                .trim()
                .to_owned()
        };
        assert_eq!(text_of("#total-income"), "$0.00");
        assert_eq!(text_of("#total-expenses"), "$250.00");
        assert_eq!(text_of("#total-net"), "-$250.00");
    }

    #[tokio::test]
    async fn malformed_filter_parameters_are_ignored() {
        let (state, user_id) = get_test_state();
        let raw_query = RawFilterQuery {
            kind: Some("refund".to_owned()),
            start_date: Some("not a date".to_owned()),
            ..Default::default()
        };

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            HxRequest(true),
            Query(raw_query),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response_body(response).await;
        let html = Html::parse_fragment(&body);
        let rows = html
            .select(&Selector::parse("tbody tr").unwrap())
            .count();
        assert_eq!(rows, 3, "expected the unfiltered transaction list");
    }
}
