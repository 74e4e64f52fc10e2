//! Month-by-month balances computed from a user's incomes and expenses.

mod aggregation;
mod endpoint;
mod period;
mod recurrence;

pub use aggregation::{BalanceSnapshot, aggregate, aggregate_transactions};
pub use endpoint::get_balances;
pub use period::{DateRange, Period};
