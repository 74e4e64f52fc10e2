use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    Error,
    transaction::{
        Transaction, TransactionBuilder, TransactionKind, TransactionState, create_transaction,
    },
    user::UserID,
};

/// A route handler for recording a new income, responds with the created income.
pub async fn create_income_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    body: Result<Json<TransactionBuilder>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(builder) = body?;

    create(TransactionKind::Income, &state, user_id, builder)
}

/// A route handler for recording a new expense, responds with the created expense.
pub async fn create_expense_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    body: Result<Json<TransactionBuilder>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(builder) = body?;

    create(TransactionKind::Expense, &state, user_id, builder)
}

fn create(
    kind: TransactionKind,
    state: &TransactionState,
    user_id: UserID,
    builder: TransactionBuilder,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(kind, user_id, builder, &connection).inspect_err(
        |error| tracing::warn!("could not create {kind:?} for user {user_id}: {error}"),
    )?;

    tracing::debug!("created {kind:?} {} for user {user_id}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}
