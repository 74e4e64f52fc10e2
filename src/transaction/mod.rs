//! Income and expense management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its `Recurrence` and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and deleting incomes and expenses
//! - JSON route handlers for the income and expense endpoints

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    Recurrence, Transaction, TransactionBuilder, TransactionKind, create_transaction,
    create_transaction_tables, delete_transaction, get_transactions,
};
pub use create_endpoint::{create_expense_endpoint, create_income_endpoint};
pub use delete_endpoint::{delete_expense_endpoint, delete_income_endpoint};
pub use list_endpoint::{get_expenses, get_incomes};

/// The state needed by the income and expense endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
