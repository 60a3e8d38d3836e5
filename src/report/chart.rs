//! Chart-ready views of the dashboard.
//!
//! Each function turns a summary table into a `Chart`: titled, labelled
//! series plus optional horizontal reference lines. Drawing is left to the
//! renderers.

use crate::models::{AnomalyReport, DashboardViews, HourSummary, SeasonSummary, TrendRow, WorkingDaySummary};
use serde::{Deserialize, Serialize};

/// How a series is meant to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    Line,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub kind: SeriesKind,
    pub points: Vec<Point>,
}

/// Horizontal line at a fixed y value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
}

/// A renderer-agnostic chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Stable identifier, e.g. "hourly".
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_lines: Vec<ReferenceLine>,
}

impl Chart {
    fn new(id: &str, title: impl Into<String>, x_label: &str, y_label: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.into(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            reference_lines: Vec::new(),
        }
    }

    fn with_series(mut self, label: &str, kind: SeriesKind, points: Vec<Point>) -> Self {
        self.series.push(Series {
            label: label.to_string(),
            kind,
            points,
        });
        self
    }

    /// True when no series has any point.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    pub fn series(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.label == label)
    }
}

fn point(x: impl ToString, y: f64) -> Point {
    Point {
        x: x.to_string(),
        y,
    }
}

/// Label used for the working-day dimension.
pub fn working_day_label(working_day: bool) -> &'static str {
    if working_day {
        "Working Day"
    } else {
        "Non-working Day"
    }
}

/// Registered and casual means by hour.
pub fn hourly_chart(rows: &[HourSummary]) -> Chart {
    Chart::new("hourly", "Average Bike Rental Count by Hour", "Hour", "Average Count")
        .with_series(
            "Registered",
            SeriesKind::Bar,
            rows.iter().map(|r| point(r.key, r.mean_registered)).collect(),
        )
        .with_series(
            "Casual",
            SeriesKind::Bar,
            rows.iter().map(|r| point(r.key, r.mean_casual)).collect(),
        )
}

pub fn working_day_chart(rows: &[WorkingDaySummary]) -> Chart {
    Chart::new(
        "working_day",
        "Average Bike Rental Count by Working Day",
        "Working Day",
        "Average Count",
    )
    .with_series(
        "Registered",
        SeriesKind::Bar,
        rows.iter()
            .map(|r| point(working_day_label(r.key), r.mean_registered))
            .collect(),
    )
    .with_series(
        "Casual",
        SeriesKind::Bar,
        rows.iter()
            .map(|r| point(working_day_label(r.key), r.mean_casual))
            .collect(),
    )
}

pub fn seasonal_chart(rows: &[SeasonSummary]) -> Chart {
    Chart::new("seasonal", "Average Bike Rental Count by Season", "Season", "Average Count")
        .with_series(
            "Registered",
            SeriesKind::Bar,
            rows.iter().map(|r| point(r.key, r.mean_registered)).collect(),
        )
        .with_series(
            "Casual",
            SeriesKind::Bar,
            rows.iter().map(|r| point(r.key, r.mean_casual)).collect(),
        )
}

/// Monthly totals; the title names the covered months.
pub fn trend_chart(rows: &[TrendRow]) -> Chart {
    let title = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => format!(
            "Bike Rental Trend by Month ({} - {})",
            first.date.format("%B %Y"),
            last.date.format("%B %Y")
        ),
        _ => "Bike Rental Trend by Month".to_string(),
    };

    Chart::new("trend", title, "Month", "Total Count").with_series(
        "Total",
        SeriesKind::Line,
        rows.iter().map(|r| point(r.label(), r.total as f64)).collect(),
    )
}

/// Daily change with flagged days and the symmetric threshold.
pub fn anomaly_chart(report: &AnomalyReport) -> Chart {
    let mut chart = Chart::new(
        "anomalies",
        "Daily Change in Bike Rental Count with Anomalies",
        "Date",
        "Daily Change in Count",
    )
    .with_series(
        "Daily Change",
        SeriesKind::Line,
        report
            .daily
            .iter()
            .map(|d| point(d.date, d.change as f64))
            .collect(),
    )
    .with_series(
        "Anomaly",
        SeriesKind::Scatter,
        report
            .anomalies
            .iter()
            .map(|d| point(d.date, d.change as f64))
            .collect(),
    );

    chart.reference_lines = vec![
        ReferenceLine {
            label: "Positive Threshold".to_string(),
            value: report.threshold,
        },
        ReferenceLine {
            label: "Negative Threshold".to_string(),
            value: -report.threshold,
        },
    ];

    chart
}

/// Every chart of one set of views, in dashboard order.
pub fn dashboard_charts(views: &DashboardViews) -> Vec<Chart> {
    vec![
        hourly_chart(&views.hourly),
        working_day_chart(&views.working_day),
        seasonal_chart(&views.seasonal),
        trend_chart(&views.trend),
        anomaly_chart(&views.anomalies),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate_by_month, detect_anomalies};
    use crate::models::{GroupSummary, RentalRecord, Season};
    use chrono::{Datelike, NaiveDate};

    fn record(y: i32, m: u32, d: u32, total: u32) -> RentalRecord {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        RentalRecord {
            date,
            hour: Some(12),
            working_day: true,
            season: Season::Winter,
            year: date.year(),
            month: date.month(),
            casual: 0,
            registered: total,
            total,
        }
    }

    #[test]
    fn test_hourly_chart_series() {
        let rows = vec![
            GroupSummary {
                key: 0u8,
                count: 2,
                mean_casual: 1.5,
                mean_registered: 10.0,
                mean_total: 11.5,
            },
            GroupSummary {
                key: 1u8,
                count: 2,
                mean_casual: 0.5,
                mean_registered: 6.0,
                mean_total: 6.5,
            },
        ];

        let chart = hourly_chart(&rows);

        assert_eq!(chart.title, "Average Bike Rental Count by Hour");
        assert_eq!(chart.series.len(), 2);
        let registered = chart.series("Registered").unwrap();
        assert_eq!(registered.kind, SeriesKind::Bar);
        assert_eq!(registered.points[1], Point { x: "1".to_string(), y: 6.0 });
        assert_eq!(chart.series("Casual").unwrap().points[0].y, 1.5);
    }

    #[test]
    fn test_working_day_labels() {
        let rows = vec![GroupSummary {
            key: false,
            count: 1,
            mean_casual: 100.0,
            mean_registered: 20.0,
            mean_total: 120.0,
        }];
        let chart = working_day_chart(&rows);
        assert_eq!(chart.series[0].points[0].x, "Non-working Day");
    }

    #[test]
    fn test_trend_chart_title_and_labels() {
        let rows = aggregate_by_month(&[
            record(2012, 12, 3, 5),
            record(2011, 1, 3, 10),
            record(2011, 1, 4, 15),
        ]);

        let chart = trend_chart(&rows);

        assert_eq!(
            chart.title,
            "Bike Rental Trend by Month (January 2011 - December 2012)"
        );
        let xs: Vec<&str> = chart.series[0].points.iter().map(|p| p.x.as_str()).collect();
        assert_eq!(xs, vec!["Jan 2011", "Dec 2012"]);
        assert_eq!(chart.series[0].points[0].y, 25.0);

        assert_eq!(trend_chart(&[]).title, "Bike Rental Trend by Month");
        assert!(trend_chart(&[]).is_empty());
    }

    #[test]
    fn test_anomaly_chart_thresholds() {
        let rows: Vec<RentalRecord> = [100, 110, 100, 110, 100, 110, 100, 600]
            .iter()
            .enumerate()
            .map(|(i, &t)| record(2011, 3, 1 + i as u32, t))
            .collect();
        let report = detect_anomalies(&rows, 2.0);

        let chart = anomaly_chart(&report);

        assert_eq!(chart.series("Daily Change").unwrap().points.len(), 8);
        let flagged = chart.series("Anomaly").unwrap();
        assert_eq!(flagged.kind, SeriesKind::Scatter);
        assert_eq!(flagged.points.len(), 1);
        assert_eq!(flagged.points[0].x, "2011-03-08");
        assert_eq!(chart.reference_lines[0].value, report.threshold);
        assert_eq!(chart.reference_lines[1].value, -report.threshold);
    }
}
