//! Type aliases for database row identifiers.

/// The integer type SQLite uses for row IDs.
pub type DatabaseId = i64;

/// The ID of a row in the transaction table.
pub type TransactionId = DatabaseId;

/// The ID of a row in the category table.
pub type CategoryId = DatabaseId;
