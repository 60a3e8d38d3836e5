//! Data models for the rental dashboard.
//!
//! This module contains the raw table rows, the summary tables produced by
//! the aggregation engine, the anomaly detector output and the assembled
//! dashboard handed to the report generators.

use crate::filter::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Meteorological season assigned to each calendar date.
///
/// Variant order is the presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Fall => write!(f, "Fall"),
            Season::Winter => write!(f, "Winter"),
        }
    }
}

impl Season {
    /// Map a numeric season code (1 = spring ... 4 = winter).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Season::from_code(code).ok_or_else(|| format!("unknown season code {}", code));
        }

        match trimmed.to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season '{}'", other)),
        }
    }
}

/// Time granularity of a rental table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grain {
    /// One row per calendar date.
    Daily,
    /// One row per (date, hour).
    Hourly,
}

impl fmt::Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grain::Daily => write!(f, "daily"),
            Grain::Hourly => write!(f, "hourly"),
        }
    }
}

/// A single row of the daily or hourly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRecord {
    /// Calendar date of the bucket.
    pub date: NaiveDate,
    /// Hour of day (0-23); only set in the hourly table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    /// Non-weekend, non-holiday day.
    pub working_day: bool,
    pub season: Season,
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Riders without a membership.
    pub casual: u32,
    /// Members.
    pub registered: u32,
    /// `casual + registered`, as supplied by the cleaned dataset.
    pub total: u32,
}

impl RentalRecord {
    /// Grouping key that is unique within a table.
    pub fn key(&self) -> (NaiveDate, Option<u8>) {
        (self.date, self.hour)
    }
}

/// A loaded table of rental records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalTable {
    pub grain: Grain,
    /// Where the rows came from (file path or a descriptive label).
    pub source: String,
    pub records: Vec<RentalRecord>,
}

impl RentalTable {
    pub fn new(grain: Grain, source: impl Into<String>, records: Vec<RentalRecord>) -> Self {
        Self {
            grain,
            source: source.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of `total` over every row.
    pub fn total_rentals(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.total)).sum()
    }

    /// First and last date present in the table, or None if it is empty.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }
}

/// Mean rider counts for one value of a grouping dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary<K> {
    /// The dimension value (hour, working-day flag, season).
    pub key: K,
    /// Number of input rows in the group.
    pub count: usize,
    pub mean_casual: f64,
    pub mean_registered: f64,
    pub mean_total: f64,
}

pub type HourSummary = GroupSummary<u8>;
pub type WorkingDaySummary = GroupSummary<bool>;
pub type SeasonSummary = GroupSummary<Season>;

/// Total rentals in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRow {
    pub year: i32,
    pub month: u32,
    /// First day of the month, used for chronological ordering.
    pub date: NaiveDate,
    /// Number of input rows in the month.
    pub count: usize,
    pub total: u64,
}

impl TrendRow {
    /// Short axis label, e.g. "Jan 2011".
    pub fn label(&self) -> String {
        self.date.format("%b %Y").to_string()
    }
}

/// Day-over-day change in total rentals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChange {
    pub date: NaiveDate,
    /// Total rentals on this date.
    pub total: u64,
    /// Difference from the previous day in the series; 0 for the first day.
    pub change: i64,
    pub is_anomaly: bool,
}

/// Output of the anomaly detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Every day in the input, chronologically.
    pub daily: Vec<DailyChange>,
    /// The subset of `daily` flagged as anomalous.
    pub anomalies: Vec<DailyChange>,
    /// Absolute change above which a day is flagged.
    pub threshold: f64,
    /// Multiple of the standard deviation used for `threshold`.
    pub sigma_multiplier: f64,
}

impl AnomalyReport {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }

    /// True when fewer than two days were observed, so no volatility
    /// estimate exists and the threshold is pinned to zero.
    pub fn is_degenerate(&self) -> bool {
        self.daily.len() < 2
    }
}

/// Every summary table computed for one pair of daily/hourly tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardViews {
    pub daily_rows: usize,
    pub hourly_rows: usize,
    pub hourly: Vec<HourSummary>,
    pub working_day: Vec<WorkingDaySummary>,
    pub seasonal: Vec<SeasonSummary>,
    pub trend: Vec<TrendRow>,
    pub anomalies: AnomalyReport,
}

/// State of the date-filtered part of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InteractiveTab {
    /// Both bounds were supplied; views were computed over the range.
    Ready {
        range: DateRange,
        views: Box<DashboardViews>,
    },
    /// Only one bound was supplied; nothing was computed.
    AwaitingInput { prompt: String },
}

/// Metadata about a dashboard build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub day_source: String,
    pub hour_source: String,
    pub daily_rows: usize,
    pub hourly_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    pub sigma_multiplier: f64,
    pub duration_seconds: f64,
}

/// The complete dashboard: unfiltered overview plus the interactive tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub overview: DashboardViews,
    pub interactive: InteractiveTab,
}

impl Dashboard {
    /// Views for the user's selection: the filtered views when the
    /// interactive tab is ready, otherwise the overview.
    pub fn selected_views(&self) -> &DashboardViews {
        match &self.interactive {
            InteractiveTab::Ready { views, .. } => views,
            InteractiveTab::AwaitingInput { .. } => &self.overview,
        }
    }
}
