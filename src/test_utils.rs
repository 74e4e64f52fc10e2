#![allow(missing_docs)]

use rusqlite::Connection;

use crate::{db::initialize, user::UserID};

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&conn).expect("Could not initialize database");

    conn
}

/// Register the user "alice" and return their ID.
#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection) -> UserID {
    crate::user::create_user("alice", connection)
        .expect("Could not create test user")
        .id
}
