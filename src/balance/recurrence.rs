//! Expands a transaction's recurrence into the dates it occurs on.

use time::{Date, Duration, Month, util::days_in_month};

use crate::transaction::{Recurrence, Transaction};

/// The dates `transaction` occurs on between `from` and `until`, both inclusive.
///
/// Occurrence `k` is the anchor date plus `k` recurrence intervals, so
/// expansion always starts from the transaction's own date even when that is
/// long before `from`. Monthly and yearly occurrences keep the anchor's day of
/// the month, clamped to the length of shorter months: an anchor of January 31
/// recurs on February 29 (or 28), March 31, April 30 and so on.
///
/// The transaction's recurrence end, if any, bounds the expansion as well.
pub(crate) fn occurrences(
    transaction: &Transaction,
    from: Date,
    until: Date,
) -> impl Iterator<Item = Date> + use<> {
    let last = match transaction.recurrence_end {
        Some(end) if transaction.recurrence != Recurrence::None => end.min(until),
        _ => until,
    };

    let anchor = transaction.date;
    let recurrence = transaction.recurrence;
    let first_step = first_step_near(anchor, recurrence, from);

    (first_step..)
        .map_while(move |step| nth_occurrence(anchor, recurrence, step))
        .skip_while(move |&date| date < from)
        .take_while(move |&date| date <= last)
}

/// A step at or shortly before the first occurrence on or after `from`.
///
/// Lets long-running recurrences skip the occurrences before the window
/// without walking through every one of them.
fn first_step_near(anchor: Date, recurrence: Recurrence, from: Date) -> i64 {
    if from <= anchor {
        return 0;
    }

    let days = (from - anchor).whole_days();
    let months = (i64::from(from.year()) - i64::from(anchor.year())) * 12
        + i64::from(u8::from(from.month()))
        - i64::from(u8::from(anchor.month()));

    let step = match recurrence {
        Recurrence::None => 0,
        Recurrence::Daily => days,
        Recurrence::Weekly => days / 7,
        Recurrence::Monthly => months - 1,
        Recurrence::Yearly => months / 12 - 1,
    };

    step.max(0)
}

/// The date of occurrence `step`, or `None` if there is no such occurrence.
fn nth_occurrence(anchor: Date, recurrence: Recurrence, step: i64) -> Option<Date> {
    match recurrence {
        Recurrence::None if step == 0 => Some(anchor),
        Recurrence::None => None,
        Recurrence::Daily => anchor.checked_add(Duration::days(step)),
        Recurrence::Weekly => anchor.checked_add(Duration::weeks(step)),
        Recurrence::Monthly => add_months(anchor, step),
        Recurrence::Yearly => add_months(anchor, step.checked_mul(12)?),
    }
}

/// Shift `date` by `months`, clamping the day to the length of the target month.
fn add_months(date: Date, months: i64) -> Option<Date> {
    let month_index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1;
    let target = month_index.checked_add(months)?;

    let year = i32::try_from(target.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(target.rem_euclid(12) + 1).ok()?).ok()?;

    let day = date.day().min(days_in_month(month, year));

    Date::from_calendar_date(year, month, day).ok()
}

#[cfg(test)]
mod recurrence_tests {
    use rust_decimal_macros::dec;
    use time::{Date, macros::date};

    use crate::{
        transaction::{Recurrence, Transaction},
        user::UserID,
    };

    use super::{add_months, occurrences};

    fn transaction(date: Date, recurrence: Recurrence, end: Option<Date>) -> Transaction {
        Transaction {
            id: 1,
            user_id: UserID::new(1),
            amount: dec!(10),
            date,
            description: String::new(),
            recurrence,
            recurrence_end: end,
        }
    }

    #[test]
    fn one_off_occurs_once_inside_window() {
        let t = transaction(date!(2024 - 01 - 15), Recurrence::None, None);

        let dates: Vec<_> = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 12 - 31)).collect();

        assert_eq!(dates, vec![date!(2024 - 01 - 15)]);
    }

    #[test]
    fn one_off_outside_window_does_not_occur() {
        let t = transaction(date!(2023 - 12 - 31), Recurrence::None, None);

        let dates: Vec<_> = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 12 - 31)).collect();

        assert!(dates.is_empty());
    }

    #[test]
    fn monthly_anchor_on_31st_clamps_to_month_end() {
        let t = transaction(date!(2024 - 01 - 31), Recurrence::Monthly, None);

        let dates: Vec<_> = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 05 - 31)).collect();

        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 31),
                date!(2024 - 02 - 29),
                date!(2024 - 03 - 31),
                date!(2024 - 04 - 30),
                date!(2024 - 05 - 31),
            ]
        );
    }

    #[test]
    fn yearly_leap_day_falls_back_to_28th() {
        let t = transaction(date!(2020 - 02 - 29), Recurrence::Yearly, None);

        let dates: Vec<_> = occurrences(&t, date!(2021 - 01 - 01), date!(2024 - 12 - 31)).collect();

        assert_eq!(
            dates,
            vec![
                date!(2021 - 02 - 28),
                date!(2022 - 02 - 28),
                date!(2023 - 02 - 28),
                date!(2024 - 02 - 29),
            ]
        );
    }

    #[test]
    fn expansion_starts_at_anchor_before_window() {
        let t = transaction(date!(2023 - 11 - 06), Recurrence::Weekly, None);

        let dates: Vec<_> = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 01 - 31)).collect();

        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 08),
                date!(2024 - 01 - 15),
                date!(2024 - 01 - 22),
                date!(2024 - 01 - 29),
            ]
        );
    }

    #[test]
    fn recurrence_end_bounds_expansion() {
        let t = transaction(
            date!(2024 - 01 - 01),
            Recurrence::Daily,
            Some(date!(2024 - 01 - 03)),
        );

        let dates: Vec<_> = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 12 - 31)).collect();

        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 02),
                date!(2024 - 01 - 03)
            ]
        );
    }

    #[test]
    fn recurrence_ending_before_window_does_not_occur() {
        let t = transaction(
            date!(2022 - 01 - 01),
            Recurrence::Monthly,
            Some(date!(2023 - 06 - 30)),
        );

        let count = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 12 - 31)).count();

        assert_eq!(count, 0);
    }

    #[test]
    fn anchor_after_window_does_not_occur() {
        let t = transaction(date!(2025 - 01 - 01), Recurrence::Daily, None);

        let count = occurrences(&t, date!(2024 - 01 - 01), date!(2024 - 12 - 31)).count();

        assert_eq!(count, 0);
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(add_months(date!(2023 - 11 - 30), 3), Some(date!(2024 - 02 - 29)));
        assert_eq!(add_months(date!(2024 - 03 - 31), -1), Some(date!(2024 - 02 - 29)));
        assert_eq!(add_months(date!(2024 - 01 - 15), 0), Some(date!(2024 - 01 - 15)));
    }

    #[test]
    fn add_months_clamps_to_month_length() {
        assert_eq!(add_months(date!(2023 - 01 - 31), 1), Some(date!(2023 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 05 - 31), 1), Some(date!(2024 - 06 - 30)));
        assert_eq!(add_months(date!(2024 - 02 - 29), 12), Some(date!(2025 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 01 - 31), 2), Some(date!(2024 - 03 - 31)));
    }
}
