//! Dashboard assembly.
//!
//! Runs every aggregation and the anomaly detector over the full tables
//! (the overview) and again over the user's date selection (the
//! interactive tab). Each call recomputes everything from the read-only
//! tables.

use crate::analysis::{
    aggregate_by_hour, aggregate_by_month, aggregate_by_season, aggregate_by_working_day,
    detect_anomalies, grouped_row_count, DEFAULT_SIGMA_MULTIPLIER,
};
use crate::config::Config;
use crate::error::FilterError;
use crate::filter::{DateBounds, DateRange};
use crate::models::{
    Dashboard, DashboardMetadata, DashboardViews, InteractiveTab, RentalRecord, RentalTable,
};
use chrono::{NaiveDate, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Inputs that shape a dashboard build besides the tables themselves.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub title: String,
    pub sigma_multiplier: f64,
    pub bounds: DateBounds,
    /// Start of the interactive selection.
    pub start: Option<NaiveDate>,
    /// End of the interactive selection.
    pub end: Option<NaiveDate>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            title: "Bike Rental Dashboard".to_string(),
            sigma_multiplier: DEFAULT_SIGMA_MULTIPLIER,
            bounds: DateBounds::default(),
            start: None,
            end: None,
        }
    }
}

impl DashboardOptions {
    /// Options from the merged configuration plus the selected bounds.
    pub fn from_config(config: &Config, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            title: config.report.title.clone(),
            sigma_multiplier: config.anomaly.sigma_multiplier,
            bounds: config.filter.bounds(),
            start,
            end,
        }
    }
}

/// Compute every summary table for one pair of tables.
pub fn compute_views(
    daily: &[RentalRecord],
    hourly: &[RentalRecord],
    sigma_multiplier: f64,
) -> DashboardViews {
    DashboardViews {
        daily_rows: daily.len(),
        hourly_rows: hourly.len(),
        hourly: aggregate_by_hour(hourly),
        working_day: aggregate_by_working_day(daily),
        seasonal: aggregate_by_season(daily),
        trend: aggregate_by_month(daily),
        anomalies: detect_anomalies(hourly, sigma_multiplier),
    }
}

/// Build the interactive tab for the selected range.
///
/// An incomplete selection yields `AwaitingInput` without computing
/// anything. Inverted or out-of-range selections are errors.
pub fn build_interactive_tab(
    daily: &RentalTable,
    hourly: &RentalTable,
    options: &DashboardOptions,
) -> Result<InteractiveTab, FilterError> {
    let range = match DateRange::from_selection(options.start, options.end, &options.bounds) {
        Ok(range) => range,
        Err(e @ FilterError::Incomplete { .. }) => {
            warn!("Interactive view paused: {}", e);
            return Ok(InteractiveTab::AwaitingInput {
                prompt: e.to_string(),
            });
        }
        Err(e) => return Err(e),
    };

    let daily = range.apply(daily);
    let hourly = range.apply(hourly);
    debug!(
        "Range {} keeps {} daily and {} hourly rows",
        range,
        daily.len(),
        hourly.len()
    );

    let views = compute_views(&daily.records, &hourly.records, options.sigma_multiplier);

    Ok(InteractiveTab::Ready {
        range,
        views: Box::new(views),
    })
}

/// Build the complete dashboard.
pub fn build_dashboard(
    daily: &RentalTable,
    hourly: &RentalTable,
    options: &DashboardOptions,
) -> Result<Dashboard, FilterError> {
    let start_time = Instant::now();

    let overview = compute_views(&daily.records, &hourly.records, options.sigma_multiplier);
    info!(
        "Overview: {} months, {} anomalies (threshold {:.1})",
        overview.trend.len(),
        overview.anomalies.anomaly_count(),
        overview.anomalies.threshold
    );
    debug!(
        "Grouped {} hourly and {} daily rows",
        grouped_row_count(&overview.hourly),
        grouped_row_count(&overview.working_day)
    );

    let interactive = build_interactive_tab(daily, hourly, options)?;

    let span = match (daily.date_span(), hourly.date_span()) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.max(b.1))),
        (a, b) => a.or(b),
    };

    let metadata = DashboardMetadata {
        title: options.title.clone(),
        generated_at: Utc::now(),
        day_source: daily.source.clone(),
        hour_source: hourly.source.clone(),
        daily_rows: daily.len(),
        hourly_rows: hourly.len(),
        first_date: span.map(|s| s.0),
        last_date: span.map(|s| s.1),
        sigma_multiplier: options.sigma_multiplier,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    Ok(Dashboard {
        metadata,
        overview,
        interactive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_dataset;
    use crate::models::Grain;
    use std::path::PathBuf;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn load_fixtures() -> (RentalTable, RentalTable) {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let daily = load_dataset(&dir.join("day_clean.csv"), Grain::Daily).unwrap();
        let hourly = load_dataset(&dir.join("hour_clean.csv"), Grain::Hourly).unwrap();
        (daily, hourly)
    }

    #[test]
    fn test_overview_from_fixtures() {
        let (daily, hourly) = load_fixtures();

        let dashboard = build_dashboard(&daily, &hourly, &DashboardOptions::default()).unwrap();
        let overview = &dashboard.overview;

        assert_eq!(overview.daily_rows, 14);
        assert_eq!(overview.hourly_rows, 30);

        let hours: Vec<u8> = overview.hourly.iter().map(|h| h.key).collect();
        assert_eq!(hours, vec![0, 8, 17]);
        assert!((overview.hourly[1].mean_registered - 235.0).abs() < 1e-9);
        assert!((overview.hourly[1].mean_casual - 11.8).abs() < 1e-9);

        assert_eq!(overview.working_day.len(), 2);
        assert_eq!(overview.working_day[1].count, 8);
        assert!((overview.working_day[1].mean_casual - 187.5).abs() < 1e-9);
        assert!((overview.working_day[1].mean_registered - 1537.5).abs() < 1e-9);
        assert_eq!(overview.working_day[0].count, 6);

        assert_eq!(overview.seasonal.len(), 1);
        assert_eq!(overview.seasonal[0].count, 14);

        let months: Vec<(i32, u32, u64)> = overview
            .trend
            .iter()
            .map(|t| (t.year, t.month, t.total))
            .collect();
        assert_eq!(months, vec![(2011, 12, 9755), (2012, 1, 11280)]);

        assert_eq!(overview.anomalies.daily.len(), 10);
        assert_eq!(overview.anomalies.anomaly_count(), 1);
        assert_eq!(overview.anomalies.anomalies[0].date, date(2012, 1, 10));
        assert_eq!(overview.anomalies.anomalies[0].change, 1006);
        assert!((overview.anomalies.threshold - 638.09).abs() < 0.01);

        let daily_sum: u64 = overview.anomalies.daily.iter().map(|d| d.total).sum();
        assert_eq!(daily_sum, hourly.total_rentals());
    }

    #[test]
    fn test_metadata_from_fixtures() {
        let (daily, hourly) = load_fixtures();
        let dashboard = build_dashboard(&daily, &hourly, &DashboardOptions::default()).unwrap();

        assert_eq!(dashboard.metadata.daily_rows, 14);
        assert_eq!(dashboard.metadata.hourly_rows, 30);
        assert_eq!(dashboard.metadata.first_date, Some(date(2011, 12, 25)));
        assert_eq!(dashboard.metadata.last_date, Some(date(2012, 1, 10)));
        assert!(dashboard.metadata.day_source.ends_with("day_clean.csv"));
    }

    #[test]
    fn test_default_selection_covers_everything() {
        let (daily, hourly) = load_fixtures();
        let dashboard = build_dashboard(&daily, &hourly, &DashboardOptions::default()).unwrap();

        match &dashboard.interactive {
            InteractiveTab::Ready { range, views } => {
                assert_eq!(range.start, date(2011, 1, 1));
                assert_eq!(range.end, date(2012, 12, 31));
                assert_eq!(**views, dashboard.overview);
            }
            other => panic!("expected ready tab, got {:?}", other),
        }
    }

    #[test]
    fn test_filtered_range_recomputes_views() {
        let (daily, hourly) = load_fixtures();
        let options = DashboardOptions {
            start: Some(date(2012, 1, 1)),
            end: Some(date(2012, 1, 5)),
            ..DashboardOptions::default()
        };

        let dashboard = build_dashboard(&daily, &hourly, &options).unwrap();

        let views = dashboard.selected_views();
        assert_eq!(views.daily_rows, 5);
        assert_eq!(views.hourly_rows, 15);
        assert_eq!(views.trend.len(), 1);
        assert_eq!(views.trend[0].month, 1);
        assert_eq!(views.anomalies.daily.len(), 5);
        assert!(views.anomalies.anomalies.is_empty());
        assert!((views.anomalies.threshold - 52.58).abs() < 0.01);

        // The overview is untouched by the selection.
        assert_eq!(dashboard.overview.daily_rows, 14);
    }

    #[test]
    fn test_single_day_selection_is_degenerate() {
        let (daily, hourly) = load_fixtures();
        let options = DashboardOptions {
            start: Some(date(2012, 1, 3)),
            end: Some(date(2012, 1, 3)),
            ..DashboardOptions::default()
        };

        let dashboard = build_dashboard(&daily, &hourly, &options).unwrap();
        let anomalies = &dashboard.selected_views().anomalies;

        assert!(anomalies.is_degenerate());
        assert_eq!(anomalies.threshold, 0.0);
        assert!(anomalies.anomalies.is_empty());
    }

    #[test]
    fn test_start_only_pauses_interactive_tab() {
        let (daily, hourly) = load_fixtures();
        let options = DashboardOptions {
            start: Some(date(2012, 1, 1)),
            ..DashboardOptions::default()
        };

        let tab = build_interactive_tab(&daily, &hourly, &options).unwrap();

        match tab {
            InteractiveTab::AwaitingInput { prompt } => {
                assert!(prompt.contains("start and an end date"));
            }
            other => panic!("expected prompt, got {:?}", other),
        }

        // The rest of the dashboard stays usable.
        let dashboard = build_dashboard(&daily, &hourly, &options).unwrap();
        assert_eq!(dashboard.selected_views(), &dashboard.overview);
        assert_eq!(dashboard.overview.anomalies.anomaly_count(), 1);
    }

    #[test]
    fn test_inverted_selection_is_error() {
        let (daily, hourly) = load_fixtures();
        let options = DashboardOptions {
            start: Some(date(2012, 1, 5)),
            end: Some(date(2012, 1, 1)),
            ..DashboardOptions::default()
        };

        let err = build_dashboard(&daily, &hourly, &options).unwrap_err();
        assert!(matches!(err, FilterError::Inverted { .. }));
    }

    #[test]
    fn test_empty_tables() {
        let daily = RentalTable::new(Grain::Daily, "empty-day", vec![]);
        let hourly = RentalTable::new(Grain::Hourly, "empty-hour", vec![]);

        let dashboard = build_dashboard(&daily, &hourly, &DashboardOptions::default()).unwrap();

        assert!(dashboard.overview.hourly.is_empty());
        assert!(dashboard.overview.trend.is_empty());
        assert_eq!(dashboard.overview.anomalies.threshold, 0.0);
        assert_eq!(dashboard.metadata.first_date, None);
    }

    #[test]
    fn test_compute_views_is_idempotent() {
        let (daily, hourly) = load_fixtures();
        let first = compute_views(&daily.records, &hourly.records, 2.0);
        let second = compute_views(&daily.records, &hourly.records, 2.0);
        assert_eq!(first, second);
    }
}
