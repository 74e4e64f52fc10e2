//! Calendar-month periods and the date range they partition.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::Error;

/// A calendar month.
///
/// Periods order chronologically, year first and then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// The calendar year, e.g. 2024.
    pub year: i32,
    /// The month of the year, from 1 for January to 12 for December.
    pub month: u8,
}

impl Period {
    /// The period that `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// The period straight after this one.
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The number of months from `earlier` to `self`, negative if `earlier` is later.
    pub fn months_since(self, earlier: Period) -> i64 {
        (i64::from(self.year) - i64::from(earlier.year)) * 12 + i64::from(self.month)
            - i64::from(earlier.month)
    }
}

/// An inclusive range of dates with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Create the range `[start, end]`.
    ///
    /// # Errors
    /// Returns [Error::InvalidRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// The first day in the range.
    pub fn start(&self) -> Date {
        self.start
    }

    /// The last day in the range.
    pub fn end(&self) -> Date {
        self.end
    }

    /// Whether `date` lies inside the range, bounds included.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// The calendar months touched by the range, in order.
    ///
    /// The first and last month may only be partly covered.
    pub fn periods(&self) -> Vec<Period> {
        let last = Period::containing(self.end);
        let mut period = Period::containing(self.start);
        let mut periods = Vec::with_capacity(last.months_since(period) as usize + 1);

        while period <= last {
            periods.push(period);
            period = period.next();
        }

        periods
    }

    /// The position of the period containing `date` in [DateRange::periods],
    /// or `None` if `date` lies outside the range.
    pub fn period_index(&self, date: Date) -> Option<usize> {
        if !self.contains(date) {
            return None;
        }

        let offset = Period::containing(date).months_since(Period::containing(self.start));

        usize::try_from(offset).ok()
    }
}
