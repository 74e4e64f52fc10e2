//! Code for creating the user table and fetching users from the database.
//!
//! Users are registered by the external identity provider, the application
//! only keeps the provider's subject identifier so that records can be owned
//! by a stable integer ID.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The identifier the identity provider uses for this user.
    pub subject: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                subject TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DataAccessError] if an SQL related error occurred, e.g.,
/// `subject` is already registered.
pub fn create_user(subject: &str, connection: &Connection) -> Result<User, Error> {
    connection.execute("INSERT INTO user (subject) VALUES (?1)", (subject,))?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        subject: subject.to_owned(),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, subject FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], |row| {
            Ok(User {
                id: UserID::new(row.get(0)?),
                subject: row.get(1)?,
            })
        })
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::user::{UserID, create_user, get_user_by_id};

    use super::{Error, create_user_table};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user("auth0|alice", &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.subject, "auth0|alice");
    }

    #[test]
    fn insert_duplicate_subject_fails() {
        let db_connection = get_db_connection();
        create_user("auth0|alice", &db_connection).unwrap();

        let result = create_user("auth0|alice", &db_connection);

        assert!(matches!(result, Err(Error::DataAccessError(_))));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user("auth0|bob", &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }
}
