//! The shared views for the transactions page: the filter form, the totals
//! strip, and the transactions table.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState,
    category::Category,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency,
    },
};

use super::{
    core::{Transaction, TransactionType},
    filter::TransactionFilter,
    totals::Totals,
};

/// The state needed by the transaction route handlers.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for reading and writing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The filter form for narrowing the displayed transactions.
///
/// The form issues a GET to `target_endpoint` and swaps the result into the
/// element selected by `swap_target`, so filtering never reloads the full
/// page.
pub fn filter_form(
    target_endpoint: &str,
    swap_target: &str,
    categories: &[Category],
    filter: &TransactionFilter,
) -> Markup {
    html! {
        form
            hx-get=(target_endpoint)
            hx-target=(swap_target)
            hx-swap="outerHTML"
            hx-push-url="true"
            class="flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filter.kind.is_none()] { "All" }
                    @for kind in [TransactionType::Income, TransactionType::Expense] {
                        option value=(kind) selected[filter.kind == Some(kind)]
                        {
                            @match kind {
                                TransactionType::Income => { "Income" }
                                TransactionType::Expense => { "Expense" }
                            }
                        }
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    name="start_date"
                    id="start_date"
                    type="date"
                    value=[filter.start_date.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    name="end_date"
                    id="end_date"
                    type="date"
                    value=[filter.end_date.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset class="flex flex-wrap gap-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Categories" }
                @for category in categories {
                    label class="inline-flex items-center gap-1 text-sm"
                    {
                        input
                            type="checkbox"
                            name="category"
                            value=(category.id)
                            checked[filter.categories.contains(&category.id)];
                        (category.name)
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    }
}

/// The income, expense, and net totals for the displayed transactions.
pub fn totals_strip(totals: &Totals) -> Markup {
    html! {
        dl class="grid grid-cols-3 gap-4 mb-6 text-center"
        {
            div
            {
                dt class="text-sm text-gray-500" { "Income" }
                dd id="total-income" class="text-lg font-semibold text-green-600"
                {
                    (format_currency(totals.income))
                }
            }
            div
            {
                dt class="text-sm text-gray-500" { "Expenses" }
                dd id="total-expenses" class="text-lg font-semibold text-red-600"
                {
                    (format_currency(totals.expense))
                }
            }
            div
            {
                dt class="text-sm text-gray-500" { "Net" }
                dd id="total-net" class="text-lg font-semibold"
                {
                    (format_currency(totals.net()))
                }
            }
        }
    }
}

fn category_name<'a>(categories: &'a [Category], transaction: &Transaction) -> &'a str {
    categories
        .iter()
        .find(|category| category.id == transaction.category_id)
        .map(|category| category.name.as_str())
        .unwrap_or("Unknown")
}

/// The table listing the displayed transactions, newest first.
pub fn transactions_table(transactions: &[Transaction], categories: &[Category]) -> Markup {
    html! {
        @if transactions.is_empty() {
            p class="text-gray-500" { "No transactions match the current filters." }
        } @else {
            table class="w-full border-collapse"
            {
                thead
                {
                    tr
                    {
                        th class=(TABLE_HEADER_STYLE) { "Date" }
                        th class=(TABLE_HEADER_STYLE) { "Category" }
                        th class=(TABLE_HEADER_STYLE) { "Type" }
                        th class=(TABLE_HEADER_STYLE) { "Amount" }
                        th class=(TABLE_HEADER_STYLE) { "" }
                    }
                }
                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.date) }
                            td class=(TABLE_CELL_STYLE) { (category_name(categories, transaction)) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @match transaction.kind {
                                    TransactionType::Income => {
                                        span class="text-green-600" { "Income" }
                                    }
                                    TransactionType::Expense => {
                                        span class="text-red-600" { "Expense" }
                                    }
                                }
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @match transaction.kind {
                                    TransactionType::Income => {
                                        (format_currency(transaction.amount))
                                    }
                                    TransactionType::Expense => {
                                        (format_currency(-transaction.amount))
                                    }
                                }
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                a
                                    href=(endpoints::format_endpoint(
                                        endpoints::EDIT_TRANSACTION_VIEW,
                                        transaction.id,
                                    ))
                                    class=(LINK_STYLE)
                                {
                                    "Edit"
                                }
                                " "
                                button
                                    hx-delete=(endpoints::format_endpoint(
                                        endpoints::TRANSACTION,
                                        transaction.id,
                                    ))
                                    hx-target="closest tr"
                                    hx-swap="outerHTML"
                                    hx-confirm="Delete this transaction?"
                                    class=(BUTTON_DELETE_STYLE)
                                {
                                    "Delete"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The container the filter form swaps: totals followed by the table.
pub fn transactions_container(
    transactions: &[Transaction],
    categories: &[Category],
    totals: &Totals,
) -> Markup {
    html! {
        div id="transactions-container"
        {
            (totals_strip(totals))
            (transactions_table(transactions, categories))
        }
    }
}
