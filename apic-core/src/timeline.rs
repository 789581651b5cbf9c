//! Month-resolution time axis and time labels.
//!
//! The source fields are indexed by calendar month. [`MonthStamp`] is a
//! month-start timestamp, [`MonthAxis`] the contiguous monthly axis shared by
//! every field in a store, and [`TimeLabel`] the tagged label attached to the
//! steps of a resampled view: annual-family reductions are labelled by a year,
//! sub-annual views by a month. Keeping the two cases in one tagged union
//! means callers cannot misinterpret an annual index as a literal date.

use crate::errors::{ApicError, ApicResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Floating point type used for all field values. Missing data is NaN.
pub type FloatValue = f64;

/// A month-start timestamp, e.g. 1990-01.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthStamp {
    pub year: i32,
    /// Calendar month, 1..=12
    pub month: u32,
}

impl MonthStamp {
    /// Create a new month stamp.
    ///
    /// # Panics
    ///
    /// Panics if `month` is not in 1..=12.
    pub fn new(year: i32, month: u32) -> Self {
        assert!(
            (1..=12).contains(&month),
            "month must be in 1..=12, got {}",
            month
        );
        Self { year, month }
    }

    /// Number of whole months since year 0, used for index arithmetic.
    fn ordinal(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// The stamp `months` months after (or before, if negative) this one.
    pub fn offset(self, months: i64) -> Self {
        let ord = self.ordinal() + months;
        Self {
            year: ord.div_euclid(12) as i32,
            month: (ord.rem_euclid(12) + 1) as u32,
        }
    }

    /// Signed number of months from `other` to `self`.
    pub fn months_since(self, other: MonthStamp) -> i64 {
        self.ordinal() - other.ordinal()
    }

    /// The first day of the month as a calendar date.
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("month is validated on construction")
    }
}

impl fmt::Display for MonthStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A contiguous monthly time axis.
///
/// Shared (via the owning field) by all fields of a store; the production
/// dataset spans 1962-01 to 2023-12 but the axis itself is arbitrary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAxis {
    start: MonthStamp,
    len: usize,
}

impl MonthAxis {
    pub fn new(start: MonthStamp, len: usize) -> ApicResult<Self> {
        if len == 0 {
            return Err(ApicError::AxisMismatch("time axis is empty".to_string()));
        }
        Ok(Self { start, len })
    }

    /// Axis spanning `start..=end` inclusive.
    pub fn spanning(start: MonthStamp, end: MonthStamp) -> ApicResult<Self> {
        let len = end.months_since(start) + 1;
        if len <= 0 {
            return Err(ApicError::AxisMismatch(format!(
                "time axis end {} precedes start {}",
                end, start
            )));
        }
        Self::new(start, len as usize)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> MonthStamp {
        self.start
    }

    pub fn last(&self) -> MonthStamp {
        self.start.offset(self.len as i64 - 1)
    }

    /// The stamp at index `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn stamp(&self, index: usize) -> MonthStamp {
        assert!(index < self.len, "time index {} out of bounds", index);
        self.start.offset(index as i64)
    }

    /// Index of `stamp` on this axis, or `None` if it falls outside.
    pub fn index_of(&self, stamp: MonthStamp) -> Option<usize> {
        let offset = stamp.months_since(self.start);
        if offset < 0 || offset >= self.len as i64 {
            None
        } else {
            Some(offset as usize)
        }
    }

    pub fn contains(&self, stamp: MonthStamp) -> bool {
        self.index_of(stamp).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = MonthStamp> + '_ {
        (0..self.len).map(|i| self.stamp(i))
    }
}

/// Time label of one step of a resampled view.
///
/// Annual-family resolutions label each step with the calendar year at the
/// start of the averaging period; monthly and running-mean resolutions label
/// each step with its month. Callers branch on the variant instead of
/// guessing from the resolution tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeLabel {
    /// A calendar year (the year the averaging period starts in).
    Year(i32),
    /// A month-start timestamp.
    Month(MonthStamp),
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLabel::Year(y) => write!(f, "{}", y),
            TimeLabel::Month(m) => write!(f, "{}", m),
        }
    }
}
