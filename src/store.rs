//! The read-only view of a user's incomes and expenses used by the balance aggregator.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    receipt::get_receipt_expenses,
    transaction::{Transaction, TransactionKind, get_transactions},
    user::UserID,
};

/// Supplies the incomes and expenses that belong to a user.
///
/// Implementers must only return records owned by `user_id`.
pub trait TransactionSource {
    /// Every income belonging to `user_id`.
    fn list_incomes(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Every expense belonging to `user_id`, including receipt items.
    fn list_expenses(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;
}

/// Reads transactions and receipt items from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionSource {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionSource {
    /// Create a new source for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        f(&connection)
    }
}

impl TransactionSource for SQLiteTransactionSource {
    fn list_incomes(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.with_connection(|connection| {
            get_transactions(TransactionKind::Income, user_id, connection)
        })
    }

    /// Plain expenses come first, followed by one expense per receipt item.
    fn list_expenses(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.with_connection(|connection| {
            let mut expenses = get_transactions(TransactionKind::Expense, user_id, connection)?;
            expenses.extend(get_receipt_expenses(user_id, connection)?);

            Ok(expenses)
        })
    }
}
