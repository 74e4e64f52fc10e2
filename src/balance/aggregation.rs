//! Rolls incomes and expenses up into month-by-month balance snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    balance::{
        period::{DateRange, Period},
        recurrence::occurrences,
    },
    store::TransactionSource,
    transaction::Transaction,
    user::UserID,
};

/// The income, expense and resulting balance for one calendar month.
///
/// Snapshots are computed on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    /// The month the snapshot covers.
    #[serde(flatten)]
    pub period: Period,
    /// The sum of income occurrences in the month.
    pub total_income: Decimal,
    /// The sum of expense occurrences in the month.
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub net_change: Decimal,
    /// The balance at the end of the month.
    pub running_balance: Decimal,
}

/// Aggregate `user_id`'s incomes and expenses between `start` and `end`, inclusive.
///
/// Produces one snapshot per calendar month touched by the range, in order.
/// The running balance starts from `opening_balance`.
///
/// `user_id` is assumed to refer to an existing user, an unknown user simply
/// has no transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidRange] if `start` is after `end`,
/// - [Error::AmountOverflow] if the totals are too large to represent,
/// - or the error from `source` if the transactions could not be fetched.
pub fn aggregate<S>(
    source: &S,
    user_id: UserID,
    start: Date,
    end: Date,
    opening_balance: Decimal,
) -> Result<Vec<BalanceSnapshot>, Error>
where
    S: TransactionSource + ?Sized,
{
    let range = DateRange::new(start, end)?;

    let incomes = owned_by(source.list_incomes(user_id)?, user_id);
    let expenses = owned_by(source.list_expenses(user_id)?, user_id);

    tracing::debug!(
        "aggregating {} incomes and {} expenses for user {user_id} from {start} to {end}",
        incomes.len(),
        expenses.len()
    );

    aggregate_transactions(&incomes, &expenses, range, opening_balance)
}

fn owned_by(transactions: Vec<Transaction>, user_id: UserID) -> Vec<Transaction> {
    transactions
        .into_iter()
        .filter(|transaction| transaction.user_id == user_id)
        .collect()
}

/// Aggregate already fetched incomes and expenses over `range`.
///
/// Each income or expense contributes its amount once for every occurrence
/// that falls inside `range`. Recurring transactions dated before the range
/// still count for the occurrences that land inside it.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a total or balance does not fit in a [Decimal].
pub fn aggregate_transactions(
    incomes: &[Transaction],
    expenses: &[Transaction],
    range: DateRange,
    opening_balance: Decimal,
) -> Result<Vec<BalanceSnapshot>, Error> {
    let periods = range.periods();
    let income_totals = sum_by_period(incomes, &range, periods.len())?;
    let expense_totals = sum_by_period(expenses, &range, periods.len())?;

    let mut running_balance = opening_balance;

    periods
        .into_iter()
        .zip(income_totals.into_iter().zip(expense_totals))
        .map(|(period, (total_income, total_expense))| {
            let net_change = total_income
                .checked_sub(total_expense)
                .ok_or(Error::AmountOverflow)?;
            running_balance = running_balance
                .checked_add(net_change)
                .ok_or(Error::AmountOverflow)?;

            Ok(BalanceSnapshot {
                period,
                total_income,
                total_expense,
                net_change,
                running_balance,
            })
        })
        .collect()
}

fn sum_by_period(
    transactions: &[Transaction],
    range: &DateRange,
    len: usize,
) -> Result<Vec<Decimal>, Error> {
    let mut totals = vec![Decimal::ZERO; len];

    for transaction in transactions {
        for date in occurrences(transaction, range.start(), range.end()) {
            if let Some(total) = range
                .period_index(date)
                .and_then(|index| totals.get_mut(index))
            {
                *total = total
                    .checked_add(transaction.amount)
                    .ok_or(Error::AmountOverflow)?;
            }
        }
    }

    Ok(totals)
}
