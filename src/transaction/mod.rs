//! Transactions are the individual income and expense records that make up a
//! user's ledger.
//!
//! This module contains the data model and database queries, the filter layer
//! shared by the transactions and charts pages, form validation, and the
//! route handlers for viewing and editing transactions.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod filter;
mod form;
mod new_transaction_page;
mod totals;
mod transactions_page;
mod view;

pub use core::{
    NewTransaction, Transaction, TransactionType, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use filter::{RawFilterQuery, TransactionFilter, fetch_transactions};
pub use form::{TransactionFormData, ValidationErrors, transaction_form};
pub use new_transaction_page::get_new_transaction_page;
pub use totals::Totals;
pub use transactions_page::get_transactions_page;
pub use view::{TransactionState, filter_form};
