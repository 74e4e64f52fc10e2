//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/incomes/{income_id}', use [format_endpoint].

/// The route for checking the server is up. Does not require a session.
pub const HEALTH: &str = "/api/health";
/// The route for the month-by-month balances of the logged in user.
pub const BALANCES: &str = "/api/balances";
/// The route to list and create incomes.
pub const INCOMES: &str = "/api/incomes";
/// The route to delete a single income.
pub const INCOME: &str = "/api/incomes/{income_id}";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to list and create receipts.
pub const RECEIPTS: &str = "/api/receipts";
/// The route to delete a single receipt.
pub const RECEIPT: &str = "/api/receipts/{receipt_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace,
/// e.g. '{income_id}' in '/api/incomes/{income_id}'. Only the first parameter
/// is replaced, and a path without one is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
