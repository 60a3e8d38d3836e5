//! Rental table loading.
//!
//! This module reads the cleaned daily and hourly CSV tables into
//! `RentalTable`s. Column names are a fixed contract: `Date`, `Hour`,
//! `Working Day`, `Season`, `Year`, `Month`, `Casual`, `Registered`,
//! `Total`. Unknown columns are ignored.

use crate::error::{LoadError, LoadResult};
use crate::models::{Grain, RentalRecord, RentalTable, Season};
use chrono::{Datelike, Month, NaiveDate};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every table must carry.
const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Working Day", "Season", "Casual", "Registered", "Total"];

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// One CSV row as written by the cleaning step.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Hour", default)]
    hour: Option<String>,
    #[serde(rename = "Working Day")]
    working_day: String,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Month", default)]
    month: Option<String>,
    #[serde(rename = "Casual")]
    casual: u32,
    #[serde(rename = "Registered")]
    registered: u32,
    #[serde(rename = "Total")]
    total: u32,
}

impl RawRow {
    fn into_record(self, grain: Grain, source: &str, line: u64) -> LoadResult<RentalRecord> {
        let invalid = |column: &'static str, value: &str| LoadError::InvalidField {
            path: source.to_string(),
            line,
            column,
            value: value.to_string(),
        };

        let date = parse_date(&self.date).ok_or_else(|| invalid("Date", &self.date))?;

        let hour = match grain {
            Grain::Daily => None,
            Grain::Hourly => {
                let hour = self.hour.as_deref().and_then(parse_hour);
                if hour.is_none() {
                    return Err(LoadError::InvalidHour {
                        path: source.to_string(),
                        line,
                    });
                }
                hour
            }
        };

        let working_day = parse_working_day(&self.working_day)
            .ok_or_else(|| invalid("Working Day", &self.working_day))?;

        let season: Season = self
            .season
            .parse()
            .map_err(|_| invalid("Season", &self.season))?;

        let year = match self.year.as_deref() {
            Some(raw) => parse_year(raw).ok_or_else(|| invalid("Year", raw))?,
            None => date.year(),
        };

        let month = match self.month.as_deref() {
            Some(raw) => parse_month(raw).ok_or_else(|| invalid("Month", raw))?,
            None => date.month(),
        };

        Ok(RentalRecord {
            date,
            hour,
            working_day,
            season,
            year,
            month,
            casual: self.casual,
            registered: self.registered,
            total: self.total,
        })
    }
}

/// Load a rental table from a CSV file.
pub fn load_dataset(path: &Path, grain: Grain) -> LoadResult<RentalTable> {
    let source = path.display().to_string();
    debug!("Reading {} table from {}", grain, source);

    let file = File::open(path).map_err(|e| LoadError::MissingInput {
        path: source.clone(),
        source: e,
    })?;

    let table = read_table(file, grain, &source)?;

    if table.is_empty() {
        warn!("{} contains no {} rows", source, grain);
    } else {
        info!("Loaded {} {} rows from {}", table.len(), grain, source);
    }

    Ok(table)
}

/// Parse a rental table from any CSV reader.
pub fn read_table<R: Read>(reader: R, grain: Grain, source: &str) -> LoadResult<RentalTable> {
    let csv_error = |e: csv::Error| LoadError::Csv {
        path: source.to_string(),
        source: e,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    ensure_columns(&headers, grain, source)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for result in csv_reader.records() {
        let row = result.map_err(csv_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let raw: RawRow = row.deserialize(Some(&headers)).map_err(csv_error)?;
        let record = raw.into_record(grain, source, line)?;

        if !seen.insert(record.key()) {
            let key = match record.hour {
                Some(hour) => format!("{} hour {}", record.date, hour),
                None => record.date.to_string(),
            };
            return Err(LoadError::DuplicateKey {
                path: source.to_string(),
                line,
                key,
            });
        }

        records.push(record);
    }

    Ok(RentalTable::new(grain, source, records))
}

fn ensure_columns(headers: &csv::StringRecord, grain: Grain, source: &str) -> LoadResult<()> {
    let hour_column: &[&'static str] = match grain {
        Grain::Hourly => &["Hour"],
        Grain::Daily => &[],
    };

    for &column in REQUIRED_COLUMNS.iter().chain(hour_column) {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                path: source.to_string(),
                column,
            });
        }
    }

    Ok(())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Tolerate a trailing time component, e.g. "2011-01-01 00:00:00".
    let date_part = raw.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn parse_hour(raw: &str) -> Option<u8> {
    raw.trim().parse::<u8>().ok().filter(|h| *h <= 23)
}

fn parse_working_day(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "working day" | "workingday" | "working" => Some(true),
        "0" | "false" | "no" | "n" | "holiday" | "weekend" | "non-working day"
        | "non working day" | "weekend/holiday" | "holiday/weekend" => Some(false),
        _ => None,
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    match raw.trim().parse::<i32>().ok()? {
        // Year codes used by the source dataset.
        0 => Some(2011),
        1 => Some(2012),
        year if (1000..=9999).contains(&year) => Some(year),
        _ => None,
    }
}

fn parse_month(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(number) = trimmed.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    trimmed.parse::<Month>().ok().map(|m| m.number_from_month())
}
