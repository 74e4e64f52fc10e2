//! Database initialisation and helpers shared by the table modules.

use std::str::FromStr;

use rusqlite::{Connection, Row, TransactionBehavior, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error, receipt::create_receipt_tables, transaction::create_transaction_tables,
    user::create_user_table,
};

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Create all of the database tables for the application.
///
/// Foreign key enforcement is switched on for `connection`, SQLite leaves it
/// off by default.
///
/// # Errors
/// This function may return a [Error::DataAccessError] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_tables(&transaction)?;
    create_receipt_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read a decimal that was stored as text from column `index` of `row`.
///
/// Money is kept as text so that values round-trip through SQLite exactly.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}
