//! Database schema initialization.

use rusqlite::Connection;

use crate::{
    category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the tables for the application's domain models.
///
/// Safe to call on an existing database, tables are only created if missing.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_user_table(connection)?;
    create_category_table(connection)?;
    create_transaction_table(connection)?;

    Ok(())
}
