//! Date-range filtering of rental tables.
//!
//! The interactive part of the dashboard narrows both raw tables to an
//! inclusive `[start, end]` range before recomputing every view.

use crate::error::FilterError;
use crate::models::{RentalRecord, RentalTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First date covered by the bundled dataset.
pub fn dataset_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2011, 1, 1).expect("valid calendar date")
}

/// Last date covered by the bundled dataset.
pub fn dataset_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 12, 31).expect("valid calendar date")
}

/// Inclusive limits a selected range must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl Default for DateBounds {
    fn default() -> Self {
        Self {
            min: dataset_start(),
            max: dataset_end(),
        }
    }
}

impl DateBounds {
    fn check(&self, date: NaiveDate) -> Result<(), FilterError> {
        if date < self.min || date > self.max {
            return Err(FilterError::OutOfRange {
                date,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// An inclusive, validated date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    /// Build a range, checking order and bounds.
    pub fn new(start: NaiveDate, end: NaiveDate, bounds: &DateBounds) -> Result<Self, FilterError> {
        bounds.check(start)?;
        bounds.check(end)?;

        if start > end {
            return Err(FilterError::Inverted { start, end });
        }

        Ok(Self { start, end })
    }

    /// Build a range from optional user input.
    ///
    /// No bounds at all selects the whole of `bounds`. Exactly one bound is
    /// an incomplete selection.
    pub fn from_selection(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        bounds: &DateBounds,
    ) -> Result<Self, FilterError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end, bounds),
            (None, None) => Self::new(bounds.min, bounds.max, bounds),
            (start, end) => Err(FilterError::Incomplete { start, end }),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the range, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Rows of `records` whose date falls inside the range.
    pub fn filter_records(&self, records: &[RentalRecord]) -> Vec<RentalRecord> {
        records
            .iter()
            .filter(|r| self.contains(r.date))
            .copied()
            .collect()
    }

    /// A new table holding only the rows inside the range.
    pub fn apply(&self, table: &RentalTable) -> RentalTable {
        RentalTable::new(
            table.grain,
            table.source.clone(),
            self.filter_records(&table.records),
        )
    }
}
