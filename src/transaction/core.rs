//! The transaction data model and its database queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
    user::UserId,
};

/// Whether a transaction adds to or subtracts from the user's balance.
///
/// Stored in the database as the lowercase strings `income` and `expense`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, e.g. a salary payment.
    Income,
    /// Money going out, e.g. a supermarket shop.
    Expense,
}

impl TransactionType {
    /// The lowercase string used in the database and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(()),
        }
    }
}

impl rusqlite::ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// An income or expense record belonging to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user that owns the transaction.
    pub user_id: UserId,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money in dollars, always positive.
    pub amount: f64,
    /// When the transaction occurred.
    pub date: Date,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
}

/// The data needed to insert a transaction.
///
/// This is a [Transaction] without an ID, which the database assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The ID of the user that will own the transaction.
    pub user_id: UserId,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money in dollars, always positive.
    pub amount: f64,
    /// When the transaction occurred.
    pub date: Date,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // "transaction" is an SQL keyword so the table name must stay quoted.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id),
                category_id INTEGER NOT NULL REFERENCES category(id),
                amount REAL NOT NULL CHECK(amount > 0),
                date TEXT NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('income', 'expense'))
                )",
        (),
    )?;

    Ok(())
}

/// Insert a transaction into the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if `transaction.category_id` does not refer to
///   an existing category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, category_id, amount, date, kind)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id, user_id, category_id, amount, date, kind",
        )?
        .query_row(
            (
                transaction.user_id,
                transaction.category_id,
                transaction.amount,
                transaction.date,
                transaction.kind,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(transaction.category_id)),
            error => error.into(),
        })
}

/// Get the transaction with `id` belonging to `user_id`.
///
/// A transaction owned by another user is reported as [Error::NotFound], the
/// same as a transaction that does not exist.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no matching transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, amount, date, kind
                FROM \"transaction\"
                WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id), map_transaction_row)
        .map_err(|error| error.into())
}

/// Overwrite the transaction with `transaction.id` owned by
/// `transaction.user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no matching transaction,
/// - [Error::InvalidCategory] if `transaction.category_id` does not refer to
///   an existing category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    let rows_updated = connection
        .execute(
            "UPDATE \"transaction\"
                SET category_id = ?1, amount = ?2, date = ?3, kind = ?4
                WHERE id = ?5 AND user_id = ?6",
            (
                transaction.category_id,
                transaction.amount,
                transaction.date,
                transaction.kind,
                transaction.id,
                transaction.user_id,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(transaction.category_id)),
            error => Error::SqlError(error),
        })?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the transaction with `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no matching transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Count all transactions belonging to `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn count_transactions(user_id: UserId, connection: &Connection) -> Result<i64, Error> {
    connection
        .prepare("SELECT COUNT(*) FROM \"transaction\" WHERE user_id = ?1")?
        .query_row([user_id], |row| row.get(0))
        .map_err(|error| error.into())
}

pub(crate) fn map_transaction_row(row: &rusqlite::Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        kind: row.get(5)?,
    })
}
