//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router, middleware,
    routing::{delete, get},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::auth_guard,
    balance::get_balances,
    endpoints,
    receipt::{create_receipt_endpoint, delete_receipt_endpoint, get_receipts_endpoint},
    transaction::{
        create_expense_endpoint, create_income_endpoint, delete_expense_endpoint,
        delete_income_endpoint, get_expenses, get_incomes,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(endpoints::BALANCES, get(get_balances))
        .route(
            endpoints::INCOMES,
            get(get_incomes).post(create_income_endpoint),
        )
        .route(endpoints::INCOME, delete(delete_income_endpoint))
        .route(
            endpoints::EXPENSES,
            get(get_expenses).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .route(
            endpoints::RECEIPTS,
            get(get_receipts_endpoint).post(create_receipt_endpoint),
        )
        .route(endpoints::RECEIPT, delete(delete_receipt_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Lets load balancers and uptime checks see the server is running.
async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
