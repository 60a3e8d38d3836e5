//! Domain error types.
//!
//! Loading errors are fatal for the run. Filter errors are split: an
//! incomplete range only pauses the interactive tab, the other variants
//! reject the request.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while reading a rental table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input file not found or unreadable: {path}: {source}")]
    MissingInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: &'static str },

    #[error("{path}:{line}: invalid value '{value}' for column '{column}'")]
    InvalidField {
        path: String,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("{path}:{line}: hourly table rows need an 'Hour' between 0 and 23")]
    InvalidHour { path: String, line: u64 },

    #[error("{path}:{line}: duplicate row for {key}")]
    DuplicateKey {
        path: String,
        line: u64,
        key: String,
    },
}

/// Errors raised while building a date range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Please select both a start and an end date to see the filtered dashboard")]
    Incomplete {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },

    #[error("Start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("Date {date} is outside the available range {min} to {max}")]
    OutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },
}

/// Result type for table loading.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
