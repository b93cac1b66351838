//! The charts page: an income vs expenses bar chart and a by-category donut,
//! built from the same filtered transactions as the transactions page.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
// axum's Query does not support repeated keys such as `?category=1&category=2`.
use axum_extra::extract::Query;
use axum_htmx::HxRequest;
use maud::{PreEscaped, html};

use crate::{
    Error,
    category::get_all_categories,
    charts::{
        CategoryBreakdown, ChartPanel, category_donut_chart, charts_script, charts_view,
        income_expense_chart,
    },
    endpoints,
    html::{HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        RawFilterQuery, Totals, TransactionFilter, TransactionState, fetch_transactions,
        filter_form,
    },
    user::UserId,
};

/// Display charts over the user's transactions, filtered by the query string
/// parameters.
///
/// For requests made by the filter form, only the charts container is
/// returned with an inline initialization script, so the charts redraw in
/// place. Full requests get the whole page with the scripts in the head.
pub async fn get_charts_page(
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
    let breakdown = CategoryBreakdown::from_transactions(&transactions, &categories);

    let charts = [
        ChartPanel {
            id: "income-expense-chart",
            options: income_expense_chart(&totals).to_string(),
        },
        ChartPanel {
            id: "category-chart",
            options: category_donut_chart(&breakdown).to_string(),
        },
    ];

    if is_hx_request {
        // Swapped-in scripts run immediately, so skip the DOMContentLoaded
        // wrapper the full page uses.
        let init_script = charts
            .iter()
            .map(|chart| {
                format!(
                    r#"(function() {{
                        const chart = echarts.init(document.getElementById("{}"));
                        chart.setOption({});
                        window.addEventListener('resize', chart.resize);
                    }})();"#,
                    chart.id, chart.options
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let fragment = html! {
            div id="charts-container"
            {
                (charts_view(&charts))
                script { (PreEscaped(init_script)) }
            }
        };

        return fragment.into_response();
    }

    let query_string = filter.to_query_string();
    let transactions_href = if query_string.is_empty() {
        endpoints::TRANSACTIONS_VIEW.to_owned()
    } else {
        format!("{}?{}", endpoints::TRANSACTIONS_VIEW, query_string)
    };

    let content = html! {
        (NavBar::new(endpoints::CHARTS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex items-baseline justify-between mb-6"
            {
                h1 class="text-2xl font-bold" { "Charts" }
                a href=(transactions_href) class=(LINK_STYLE) { "View transactions" }
            }

            (filter_form(
                endpoints::CHARTS_VIEW,
                "#charts-container",
                &categories,
                &filter,
            ))

            div id="charts-container"
            {
                (charts_view(&charts))
            }
        }
    };

    let scripts = [
        HeadElement::ScriptLink("/static/echarts-5.6.0-min.js".to_owned()),
        charts_script(&charts),
    ];

    base("Charts", &scripts, &content).into_response()
}
