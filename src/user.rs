//! Defines the user model and its database queries.

use std::fmt::Display;

use rusqlite::{
    Connection,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};

use crate::Error;

/// The ID of a registered user.
///
/// A newtype so the auth middleware can insert it as a request extension
/// without clashing with other integer extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw database ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for UserId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.0.into())
    }
}

impl FromSql for UserId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(UserId)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The email address the user logs in with.
    pub email: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: String,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new user in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateEmail] if a user with `email` already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_user(email: &str, password_hash: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (email, password_hash)
             VALUES (?1, ?2)
             RETURNING id, email, password_hash",
        )?
        .query_row((email, password_hash), map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateEmail,
            error => error.into(),
        })
}

/// Retrieve a user from the database by their email address.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no user has the email `email`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, email, password_hash FROM user WHERE email = :email")?
        .query_row(&[(":email", email)], map_user_row)?;

    Ok(user)
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
    })
}
