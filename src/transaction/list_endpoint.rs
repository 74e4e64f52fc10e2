use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    transaction::{Transaction, TransactionKind, TransactionState, get_transactions},
    user::UserID,
};

/// A route handler that responds with the logged in user's incomes as JSON.
pub async fn get_incomes(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    list_transactions(TransactionKind::Income, &state, user_id)
}

/// A route handler that responds with the logged in user's expenses as JSON.
///
/// Receipt items are not included, see the receipt endpoints for those.
pub async fn get_expenses(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    list_transactions(TransactionKind::Expense, &state, user_id)
}

fn list_transactions(
    kind: TransactionKind,
    state: &TransactionState,
    user_id: UserID,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions(kind, user_id, &connection).map(Json)
}
