//! The filter layer shared by the transactions page and the charts page.
//!
//! Filters arrive as query string parameters. Parsing is lenient: a missing,
//! empty, or malformed parameter never fails the request, it simply leaves
//! that constraint unset.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    Error,
    database_id::CategoryId,
    user::UserId,
};

use super::core::{Transaction, TransactionType, map_transaction_row};

/// The raw, untrusted query string parameters of a filtered page request.
///
/// Every field is optional and `category` may be repeated, e.g.
/// `?type=expense&category=1&category=3`.
#[derive(Debug, Default, Deserialize)]
pub struct RawFilterQuery {
    /// Either `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The earliest date to include, formatted as `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// The latest date to include, formatted as `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// The IDs of the categories to include.
    #[serde(default)]
    pub category: Vec<String>,
}

/// The parsed constraints on which transactions to show.
///
/// An unset field means "no constraint". The default filter matches every
/// transaction.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions of this type.
    pub kind: Option<TransactionType>,
    /// Only include transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only include transactions on or before this date.
    pub end_date: Option<Date>,
    /// Only include transactions in one of these categories.
    pub categories: Vec<CategoryId>,
}

impl TransactionFilter {
    /// Parse a filter from raw query string parameters.
    ///
    /// Values that do not parse are dropped rather than reported, so a
    /// hand-edited or stale URL degrades to a broader filter instead of an
    /// error page.
    pub fn from_raw(raw: &RawFilterQuery) -> Self {
        let date_format = format_description!("[year]-[month]-[day]");

        let kind = raw
            .kind
            .as_deref()
            .and_then(|kind| kind.parse::<TransactionType>().ok());

        let start_date = raw
            .start_date
            .as_deref()
            .and_then(|date| Date::parse(date, &date_format).ok());

        let end_date = raw
            .end_date
            .as_deref()
            .and_then(|date| Date::parse(date, &date_format).ok());

        let categories = raw
            .category
            .iter()
            .filter_map(|id| id.parse::<CategoryId>().ok())
            .collect();

        Self {
            kind,
            start_date,
            end_date,
            categories,
        }
    }

    /// Whether `transaction` satisfies every constraint in the filter.
    ///
    /// Date bounds are inclusive at both ends.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(kind) = self.kind
            && transaction.kind != kind
        {
            return false;
        }

        if let Some(start_date) = self.start_date
            && transaction.date < start_date
        {
            return false;
        }

        if let Some(end_date) = self.end_date
            && transaction.date > end_date
        {
            return false;
        }

        if !self.categories.is_empty() && !self.categories.contains(&transaction.category_id) {
            return false;
        }

        true
    }

    /// Render the filter back into query string parameters.
    ///
    /// Used to carry the active filter across links between the transactions
    /// and charts pages. The default filter renders as an empty string.
    pub fn to_query_string(&self) -> String {
        let date_format = format_description!("[year]-[month]-[day]");
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(kind) = self.kind {
            pairs.push(("type", kind.to_string()));
        }

        if let Some(start_date) = self.start_date
            && let Ok(formatted) = start_date.format(&date_format)
        {
            pairs.push(("start_date", formatted));
        }

        if let Some(end_date) = self.end_date
            && let Ok(formatted) = end_date.format(&date_format)
        {
            pairs.push(("end_date", formatted));
        }

        for category_id in &self.categories {
            pairs.push(("category", category_id.to_string()));
        }

        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }
}

/// Fetch the transactions belonging to `user_id` that match `filter`.
///
/// Results are ordered newest first, with ties broken by insertion order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn fetch_transactions(
    user_id: UserId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut sql = String::from(
        "SELECT id, user_id, category_id, amount, date, kind
            FROM \"transaction\"
            WHERE user_id = ?",
    );
    let mut params: Vec<Value> = vec![Value::Integer(user_id.as_i64())];

    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind = ?");
        params.push(Value::Text(kind.to_string()));
    }

    // Dates are stored as ISO-8601 text so string comparison matches date
    // comparison.
    if let Some(start_date) = filter.start_date {
        sql.push_str(" AND date >= ?");
        params.push(Value::Text(start_date.to_string()));
    }

    if let Some(end_date) = filter.end_date {
        sql.push_str(" AND date <= ?");
        params.push(Value::Text(end_date.to_string()));
    }

    if !filter.categories.is_empty() {
        let placeholders = vec!["?"; filter.categories.len()].join(", ");
        sql.push_str(&format!(" AND category_id IN ({placeholders})"));

        for category_id in &filter.categories {
            params.push(Value::Integer(*category_id));
        }
    }

    sql.push_str(" ORDER BY date DESC, id ASC");

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(|error| error.into()))
        .collect()
}
