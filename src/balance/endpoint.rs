use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    balance::{BalanceSnapshot, aggregate},
    store::SQLiteTransactionSource,
    timezone::local_today,
    user::UserID,
};

/// The state needed by [get_balances].
#[derive(Debug, Clone)]
pub struct BalanceState {
    /// The database connection the transactions are read from.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string accepted by [get_balances].
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    /// The first day to aggregate, defaults to the first day of `end`'s month.
    pub start: Option<Date>,
    /// The last day to aggregate, defaults to today in the server's timezone.
    pub end: Option<Date>,
    /// The balance before `start`, defaults to zero.
    #[serde(default, deserialize_with = "crate::amount::deserialize_optional")]
    pub opening_balance: Option<Decimal>,
}

/// A route handler that responds with the logged in user's monthly balances as JSON.
pub async fn get_balances(
    State(state): State<BalanceState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Result<Json<Vec<BalanceSnapshot>>, Error> {
    let Query(query) = query?;

    let end = match query.end {
        Some(end) => end,
        None => local_today(&state.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?,
    };
    let start = query
        .start
        .unwrap_or_else(|| end.replace_day(1).unwrap_or(end));
    let opening_balance = query.opening_balance.unwrap_or(Decimal::ZERO);

    let source = SQLiteTransactionSource::new(state.db_connection.clone());

    aggregate(&source, user_id, start, end, opening_balance).map(Json)
}
