//! Defines the core data models and database queries for incomes and expenses.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    db::{DatabaseId, get_decimal},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in or sends it out.
///
/// Incomes and expenses live in separate tables, the kind selects which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Money earned, e.g. wages.
    Income,
    /// Money spent, e.g. rent.
    Expense,
}

impl TransactionKind {
    fn table(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// How often a transaction repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// The transaction happens once.
    #[default]
    None,
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month, on the anchor's day of the month where it exists.
    Monthly,
    /// Every year, on the anchor's month and day where it exists.
    Yearly,
}

impl Recurrence {
    /// The integer code used to store the recurrence in the database.
    pub fn code(self) -> i64 {
        match self {
            Recurrence::None => 0,
            Recurrence::Daily => 1,
            Recurrence::Weekly => 2,
            Recurrence::Monthly => 3,
            Recurrence::Yearly => 4,
        }
    }
}

/// An integer that does not map to a [Recurrence].
#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid recurrence code")]
pub struct RecurrenceCodeError(i64);

impl TryFrom<i64> for Recurrence {
    type Error = RecurrenceCodeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Recurrence::None),
            1 => Ok(Recurrence::Daily),
            2 => Ok(Recurrence::Weekly),
            3 => Ok(Recurrence::Monthly),
            4 => Ok(Recurrence::Yearly),
            _ => Err(RecurrenceCodeError(value)),
        }
    }
}

impl ToSql for Recurrence {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Recurrence {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;

        Recurrence::try_from(code).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An income or expense.
///
/// The amount is always a non-negative magnitude, whether the transaction
/// adds to or subtracts from a balance depends on its [TransactionKind].
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money earned or spent in one occurrence.
    pub amount: Decimal,
    /// When the transaction happened, or first happens if it recurs.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// How often the transaction repeats.
    pub recurrence: Recurrence,
    /// The last date the transaction may recur on, `None` means indefinitely.
    pub recurrence_end: Option<Date>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Decimal, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            recurrence: Recurrence::None,
            recurrence_end: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// This is also the JSON body accepted by the create endpoints, so the
/// optional fields have serde defaults.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal_macros::dec;
/// use time::macros::date;
///
/// use crate::transaction::{Recurrence, Transaction};
///
/// // Wages paid on the 15th of every month until the end of the year.
/// let builder = Transaction::build(dec!(2500), date!(2025-01-15), "Wages")
///     .recurrence(Recurrence::Monthly, Some(date!(2025-12-31)));
/// ```
#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct TransactionBuilder {
    /// The non-negative amount of one occurrence.
    #[serde(deserialize_with = "crate::amount::deserialize")]
    pub amount: Decimal,
    /// The date of the (first) occurrence.
    pub date: Date,
    /// A human-readable description of the transaction.
    #[serde(default)]
    pub description: String,
    /// How often the transaction repeats.
    #[serde(default)]
    pub recurrence: Recurrence,
    /// The last date the transaction may recur on.
    #[serde(default)]
    pub recurrence_end: Option<Date>,
}

impl TransactionBuilder {
    /// Set how often the transaction repeats and when it stops.
    pub fn recurrence(mut self, recurrence: Recurrence, end: Option<Date>) -> Self {
        self.recurrence = recurrence;
        self.recurrence_end = end;
        self
    }

    /// Check the builder describes a valid transaction.
    ///
    /// A recurrence end is dropped for one-off transactions.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::NegativeAmount] if the amount is below zero,
    /// - or [Error::InvalidRecurrenceEnd] if a recurring transaction ends before it starts.
    pub fn validate(mut self) -> Result<Self, Error> {
        if self.amount < Decimal::ZERO {
            return Err(Error::NegativeAmount(self.amount));
        }

        if self.recurrence == Recurrence::None {
            self.recurrence_end = None;
        }

        match self.recurrence_end {
            Some(end) if end < self.date => Err(Error::InvalidRecurrenceEnd {
                date: self.date,
                end,
            }),
            _ => Ok(self),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new income or expense for `user_id` from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] or [Error::InvalidRecurrenceEnd] if the builder is invalid,
/// - or [Error::DataAccessError] if there is some SQL error, e.g., `user_id` is not a registered user.
pub fn create_transaction(
    kind: TransactionKind,
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate()?;

    let query = format!(
        "INSERT INTO {} (user_id, amount, date, description, recurrence, recurrence_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id, user_id, amount, date, description, recurrence, recurrence_end",
        kind.table()
    );

    let transaction = connection.prepare(&query)?.query_row(
        (
            user_id.as_i64(),
            builder.amount.to_string(),
            builder.date,
            builder.description,
            builder.recurrence,
            builder.recurrence_end,
        ),
        map_transaction_row,
    )?;

    Ok(transaction)
}

/// Get all the incomes or expenses belonging to `user_id`, ordered by date.
///
/// # Errors
/// This function will return a [Error::DataAccessError] if there is some SQL error.
pub fn get_transactions(
    kind: TransactionKind,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "SELECT id, user_id, amount, date, description, recurrence, recurrence_end
         FROM {}
         WHERE user_id = :user_id
         ORDER BY date ASC, id ASC",
        kind.table()
    );

    connection
        .prepare(&query)?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Delete the income or expense `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if no such transaction belongs to the user,
/// - or [Error::DataAccessError] if there is some other SQL error.
pub fn delete_transaction(
    kind: TransactionKind,
    user_id: UserID,
    id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let query = format!(
        "DELETE FROM {} WHERE id = ?1 AND user_id = ?2",
        kind.table()
    );

    let rows_affected = connection.execute(&query, (id, user_id.as_i64()))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the income and expense tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        let table = kind.table();

        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    amount TEXT NOT NULL,
                    date TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    recurrence INTEGER NOT NULL DEFAULT 0,
                    recurrence_end TEXT,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )"
            ),
            (),
        )?;

        connection.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_user ON {table}(user_id, date);"),
            (),
        )?;
    }

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: get_decimal(row, 2)?,
        date: row.get(3)?,
        description: row.get(4)?,
        recurrence: row.get(5)?,
        recurrence_end: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{
            Recurrence, Transaction, TransactionKind, create_transaction, delete_transaction,
            get_transactions,
        },
        user::UserID,
    };

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);

        let transaction = create_transaction(
            TransactionKind::Income,
            user_id,
            Transaction::build(dec!(1000), date!(2024 - 01 - 01), "Wages")
                .recurrence(Recurrence::Monthly, None),
            &conn,
        )
        .expect("Could not create income");

        assert!(transaction.id > 0);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.amount, dec!(1000));
        assert_eq!(transaction.recurrence, Recurrence::Monthly);
        assert_eq!(transaction.recurrence_end, None);
    }

    #[test]
    fn create_keeps_decimal_precision() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);

        let transaction = create_transaction(
            TransactionKind::Expense,
            user_id,
            Transaction::build(dec!(0.10), date!(2024 - 01 - 01), ""),
            &conn,
        )
        .unwrap();

        let got = get_transactions(TransactionKind::Expense, user_id, &conn).unwrap();
        assert_eq!(got, vec![transaction]);
        assert_eq!(got[0].amount.to_string(), "0.10");
    }

    #[test]
    fn create_fails_for_unknown_user() {
        let conn = get_test_connection();

        let result = create_transaction(
            TransactionKind::Income,
            UserID::new(999),
            Transaction::build(dec!(1), date!(2024 - 01 - 01), ""),
            &conn,
        );

        assert!(matches!(result, Err(Error::DataAccessError(_))));
    }

    #[test]
    fn incomes_and_expenses_are_separate() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        let income = create_transaction(
            TransactionKind::Income,
            user_id,
            Transaction::build(dec!(1000), date!(2024 - 01 - 01), "Wages"),
            &conn,
        )
        .unwrap();
        let expense = create_transaction(
            TransactionKind::Expense,
            user_id,
            Transaction::build(dec!(200), date!(2024 - 01 - 15), "Power"),
            &conn,
        )
        .unwrap();

        let incomes = get_transactions(TransactionKind::Income, user_id, &conn).unwrap();
        let expenses = get_transactions(TransactionKind::Expense, user_id, &conn).unwrap();

        assert_eq!(incomes, vec![income]);
        assert_eq!(expenses, vec![expense]);
    }

    #[test]
    fn get_transactions_only_returns_own_records_in_date_order() {
        let conn = get_test_connection();
        let alice = insert_test_user(&conn);
        let bob = crate::user::create_user("bob", &conn).unwrap().id;
        let later = create_transaction(
            TransactionKind::Expense,
            alice,
            Transaction::build(dec!(5), date!(2024 - 03 - 01), ""),
            &conn,
        )
        .unwrap();
        let earlier = create_transaction(
            TransactionKind::Expense,
            alice,
            Transaction::build(dec!(7), date!(2024 - 02 - 01), ""),
            &conn,
        )
        .unwrap();
        create_transaction(
            TransactionKind::Expense,
            bob,
            Transaction::build(dec!(9), date!(2024 - 02 - 15), ""),
            &conn,
        )
        .unwrap();

        let got = get_transactions(TransactionKind::Expense, alice, &conn).unwrap();

        assert_eq!(got, vec![earlier, later]);
    }

    #[test]
    fn delete_succeeds() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        let income = create_transaction(
            TransactionKind::Income,
            user_id,
            Transaction::build(dec!(1), date!(2024 - 01 - 01), ""),
            &conn,
        )
        .unwrap();

        delete_transaction(TransactionKind::Income, user_id, income.id, &conn)
            .expect("Could not delete income");

        let got = get_transactions(TransactionKind::Income, user_id, &conn).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn delete_fails_for_other_users_transaction() {
        let conn = get_test_connection();
        let alice = insert_test_user(&conn);
        let bob = crate::user::create_user("bob", &conn).unwrap().id;
        let income = create_transaction(
            TransactionKind::Income,
            alice,
            Transaction::build(dec!(1), date!(2024 - 01 - 01), ""),
            &conn,
        )
        .unwrap();

        let result = delete_transaction(TransactionKind::Income, bob, income.id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
        assert_eq!(
            get_transactions(TransactionKind::Income, alice, &conn)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn delete_fails_for_wrong_kind() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        let income = create_transaction(
            TransactionKind::Income,
            user_id,
            Transaction::build(dec!(1), date!(2024 - 01 - 01), ""),
            &conn,
        )
        .unwrap();

        let result = delete_transaction(TransactionKind::Expense, user_id, income.id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn unknown_recurrence_code_is_a_data_access_error() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        conn.execute(
            "INSERT INTO income (user_id, amount, date, recurrence) VALUES (?1, '5', '2024-01-01', 42)",
            (user_id.as_i64(),),
        )
        .unwrap();

        let result = get_transactions(TransactionKind::Income, user_id, &conn);

        assert!(matches!(result, Err(Error::DataAccessError(_))));
    }
}
