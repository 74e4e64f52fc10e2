use axum::{
    Extension,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};

use crate::{
    Error,
    db::DatabaseId,
    transaction::{TransactionKind, TransactionState, delete_transaction},
    user::UserID,
};

/// A route handler for deleting an income, responds with 204 No Content.
pub async fn delete_income_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<DatabaseId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(income_id) = path?;

    delete(TransactionKind::Income, &state, user_id, income_id)
}

/// A route handler for deleting an expense, responds with 204 No Content.
pub async fn delete_expense_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<DatabaseId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(expense_id) = path?;

    delete(TransactionKind::Expense, &state, user_id, expense_id)
}

fn delete(
    kind: TransactionKind,
    state: &TransactionState,
    user_id: UserID,
    id: DatabaseId,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(kind, user_id, id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{
            Transaction, TransactionKind, TransactionState, create_transaction,
            delete_expense_endpoint, delete_income_endpoint,
        },
    };

    #[tokio::test]
    async fn deletes_expense() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        let expense = create_transaction(
            TransactionKind::Expense,
            user_id,
            Transaction::build(dec!(20), date!(2024 - 01 - 01), ""),
            &conn,
        )
        .unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let status =
            delete_expense_endpoint(State(state), Extension(user_id), Ok(Path(expense.id)))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn deleting_missing_income_is_not_found() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn);
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result =
            delete_income_endpoint(State(state), Extension(user_id), Ok(Path(1337))).await;

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }
}
