//! Receipts and their line items.
//!
//! A receipt records a shopping trip: where, when, and what was bought. Every
//! line item counts as a one-off expense of `quantity * unit_price` on the
//! receipt date when balances are aggregated.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    db::{DatabaseId, get_decimal},
    transaction::{Recurrence, Transaction},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// One line on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// The ID of the item.
    pub id: DatabaseId,
    /// What was bought.
    pub name: String,
    /// How many units were bought, at least one.
    pub quantity: u32,
    /// The price of a single unit.
    pub unit_price: Decimal,
}

impl ReceiptItem {
    /// The amount paid for the line, `quantity * unit_price`.
    ///
    /// # Errors
    /// Returns [Error::AmountOverflow] if the total does not fit in a [Decimal].
    pub fn total(&self) -> Result<Decimal, Error> {
        line_total(self.unit_price, self.quantity)
    }
}

/// A receipt with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// The ID of the receipt.
    pub id: DatabaseId,
    /// The user that owns the receipt.
    pub user_id: UserID,
    /// The date of the purchase.
    pub date: Date,
    /// The name of the shop.
    pub store: String,
    /// The lines on the receipt.
    pub items: Vec<ReceiptItem>,
}

/// The data for a receipt that has not been saved yet.
///
/// This is also the JSON body accepted by [create_receipt_endpoint].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewReceipt {
    /// The date of the purchase.
    pub date: Date,
    /// The name of the shop.
    #[serde(default)]
    pub store: String,
    /// The lines on the receipt, must not be empty.
    pub items: Vec<NewReceiptItem>,
}

/// The data for a line item that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewReceiptItem {
    /// What was bought.
    pub name: String,
    /// How many units were bought.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// The price of a single unit.
    #[serde(deserialize_with = "crate::amount::deserialize")]
    pub unit_price: Decimal,
}

fn default_quantity() -> u32 {
    1
}

fn line_total(unit_price: Decimal, quantity: u32) -> Result<Decimal, Error> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(Error::AmountOverflow)
}

impl NewReceipt {
    fn validate(&self) -> Result<(), Error> {
        if self.items.is_empty() {
            return Err(Error::EmptyReceipt);
        }

        for item in &self.items {
            if item.quantity == 0 {
                return Err(Error::InvalidQuantity(item.name.clone()));
            }

            if item.unit_price < Decimal::ZERO {
                return Err(Error::NegativeAmount(item.unit_price));
            }

            line_total(item.unit_price, item.quantity)?;
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the receipt and receipt item tables.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_receipt_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS receipt (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                store TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS receipt_item (
                id INTEGER PRIMARY KEY,
                receipt_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity > 0),
                unit_price TEXT NOT NULL,
                FOREIGN KEY(receipt_id) REFERENCES receipt(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipt_item_receipt ON receipt_item(receipt_id);",
        (),
    )?;

    Ok(())
}

/// Save a receipt and all of its items for `user_id`.
///
/// Either the receipt and every item are saved, or nothing is.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyReceipt] if there are no items,
/// - [Error::InvalidQuantity] if an item has a quantity of zero,
/// - [Error::NegativeAmount] if an item has a negative unit price,
/// - [Error::AmountOverflow] if an item's total is too large to represent,
/// - or [Error::DataAccessError] if there is some SQL error.
pub fn create_receipt(
    user_id: UserID,
    new_receipt: NewReceipt,
    connection: &Connection,
) -> Result<Receipt, Error> {
    new_receipt.validate()?;

    let tx = connection.unchecked_transaction()?;

    let receipt_id: DatabaseId = tx.query_row(
        "INSERT INTO receipt (user_id, date, store) VALUES (?1, ?2, ?3) RETURNING id",
        (user_id.as_i64(), new_receipt.date, &new_receipt.store),
        |row| row.get(0),
    )?;

    let mut items = Vec::with_capacity(new_receipt.items.len());
    {
        let mut stmt = tx.prepare(
            "INSERT INTO receipt_item (receipt_id, name, quantity, unit_price)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, quantity, unit_price",
        )?;

        for item in new_receipt.items {
            let item = stmt.query_row(
                (
                    receipt_id,
                    item.name,
                    item.quantity,
                    item.unit_price.to_string(),
                ),
                map_item_row,
            )?;
            items.push(item);
        }
    }

    tx.commit()?;

    Ok(Receipt {
        id: receipt_id,
        user_id,
        date: new_receipt.date,
        store: new_receipt.store,
        items,
    })
}

/// Get all of `user_id`'s receipts with their items, ordered by date.
///
/// # Errors
/// This function will return a [Error::DataAccessError] if there is some SQL error.
pub fn get_receipts(user_id: UserID, connection: &Connection) -> Result<Vec<Receipt>, Error> {
    let mut receipts = connection
        .prepare(
            "SELECT id, user_id, date, store FROM receipt
             WHERE user_id = :user_id
             ORDER BY date ASC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(Receipt {
                id: row.get(0)?,
                user_id: UserID::new(row.get(1)?),
                date: row.get(2)?,
                store: row.get(3)?,
                items: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = connection.prepare(
        "SELECT id, name, quantity, unit_price FROM receipt_item
         WHERE receipt_id = :receipt_id
         ORDER BY id ASC",
    )?;

    for receipt in &mut receipts {
        receipt.items = stmt
            .query_map(&[(":receipt_id", &receipt.id)], map_item_row)?
            .collect::<Result<Vec<_>, _>>()?;
    }

    Ok(receipts)
}

/// Get every receipt item belonging to `user_id` as a one-off expense.
///
/// The expense takes its ID from the item, its amount from the item total and
/// its date from the receipt.
///
/// # Errors
/// This function will return a:
/// - [Error::AmountOverflow] if a stored item's total is too large to represent,
/// - or [Error::DataAccessError] if there is some SQL error.
pub fn get_receipt_expenses(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let rows = connection
        .prepare(
            "SELECT i.id, i.name, i.quantity, i.unit_price, r.date, r.store
             FROM receipt_item i
             INNER JOIN receipt r ON r.id = i.receipt_id
             WHERE r.user_id = :user_id
             ORDER BY r.date ASC, i.id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok((map_item_row(row)?, row.get::<_, Date>(4)?, row.get::<_, String>(5)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(item, date, store)| {
            let description = if store.is_empty() {
                item.name.clone()
            } else {
                format!("{store}: {}", item.name)
            };

            Ok(Transaction {
                id: item.id,
                user_id,
                amount: item.total()?,
                date,
                description,
                recurrence: Recurrence::None,
                recurrence_end: None,
            })
        })
        .collect()
}

/// Delete the receipt `id` and its items if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no such receipt belongs to the user,
/// - or [Error::DataAccessError] if there is some SQL error.
pub fn delete_receipt(
    user_id: UserID,
    id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM receipt WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_item_row(row: &Row) -> Result<ReceiptItem, rusqlite::Error> {
    Ok(ReceiptItem {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        unit_price: get_decimal(row, 3)?,
    })
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The state needed by the receipt endpoints.
#[derive(Debug, Clone)]
pub struct ReceiptState {
    /// The database connection for managing receipts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the logged in user's receipts as JSON.
pub async fn get_receipts_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Receipt>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_receipts(user_id, &connection).map(Json)
}

/// A route handler for saving a receipt, responds with the saved receipt.
pub async fn create_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    body: Result<Json<NewReceipt>, JsonRejection>,
) -> Result<(StatusCode, Json<Receipt>), Error> {
    let Json(new_receipt) = body?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let receipt = create_receipt(user_id, new_receipt, &connection)?;
    tracing::debug!(
        "saved receipt {} with {} items for user {user_id}",
        receipt.id,
        receipt.items.len()
    );

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// A route handler for deleting a receipt, responds with 204 No Content.
pub async fn delete_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<DatabaseId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(receipt_id) = path?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_receipt(user_id, receipt_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::test_utils::{get_test_connection, insert_test_user};

    use super::{
        NewReceipt, NewReceiptItem, ReceiptState, create_receipt_endpoint,
        delete_receipt_endpoint, get_receipts_endpoint,
    };

    #[tokio::test]
    async fn create_list_and_delete_receipt() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        let state = ReceiptState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let new_receipt = NewReceipt {
            date: date!(2024 - 03 - 03),
            store: String::new(),
            items: vec![NewReceiptItem {
                name: "Coffee beans".to_owned(),
                quantity: 1,
                unit_price: dec!(18.50),
            }],
        };

        let (status, Json(receipt)) = create_receipt_endpoint(
            State(state.clone()),
            Extension(user_id),
            Ok(Json(new_receipt)),
        )
        .await
        .expect("Could not create receipt");
        assert_eq!(status, StatusCode::CREATED);

        let Json(receipts) = get_receipts_endpoint(State(state.clone()), Extension(user_id))
            .await
            .unwrap();
        assert_eq!(receipts, vec![receipt.clone()]);

        let status = delete_receipt_endpoint(
            State(state.clone()),
            Extension(user_id),
            Ok(Path(receipt.id)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(receipts) = get_receipts_endpoint(State(state), Extension(user_id))
            .await
            .unwrap();
        assert!(receipts.is_empty());
    }
}
