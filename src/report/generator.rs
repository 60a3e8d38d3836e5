//! Markdown and JSON report generation.
//!
//! This module renders a `Dashboard` into a Markdown document (one table
//! per chart) or a pretty-printed JSON document carrying the dashboard and
//! its chart specs.

use super::chart::{dashboard_charts, Chart, SeriesKind};
use crate::models::{AnomalyReport, Dashboard, DashboardMetadata, DashboardViews, InteractiveTab};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Section headings, in dashboard order, paired with chart ids.
const SECTIONS: [(&str, &str); 5] = [
    ("hourly", "Hourly Data"),
    ("working_day", "Working Day Data"),
    ("seasonal", "Seasonal Data"),
    ("trend", "Trend Data"),
    ("anomalies", "Anomaly Detection"),
];

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard, include_daily_series: bool) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {} 🚲\n\n", dashboard.metadata.title));

    output.push_str(&generate_metadata_section(&dashboard.metadata));

    output.push_str(&generate_table_of_contents());

    // Unfiltered overview
    output.push_str(&generate_views_sections(
        &dashboard.overview,
        "##",
        include_daily_series,
    ));

    output.push_str(&generate_interactive_section(
        &dashboard.interactive,
        include_daily_series,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Daily Table:** `{}`\n", metadata.day_source));
    section.push_str(&format!("- **Hourly Table:** `{}`\n", metadata.hour_source));
    section.push_str(&format!(
        "- **Rows:** {} daily, {} hourly\n",
        metadata.daily_rows, metadata.hourly_rows
    ));
    if let (Some(first), Some(last)) = (metadata.first_date, metadata.last_date) {
        section.push_str(&format!("- **Data Range:** {} to {}\n", first, last));
    }
    section.push_str(&format!(
        "- **Anomaly Threshold:** {}σ of day-over-day change\n",
        metadata.sigma_multiplier
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Computation Time:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for (_, heading) in SECTIONS {
        toc.push_str(&format!("- [{}](#{})\n", heading, anchor(heading)));
    }
    toc.push_str("- [Filtered View](#filtered-view)\n\n");

    toc
}

fn anchor(heading: &str) -> String {
    heading.to_lowercase().replace(' ', "-")
}

/// Generate one section per chart for a set of views.
fn generate_views_sections(views: &DashboardViews, level: &str, include_daily_series: bool) -> String {
    let charts = dashboard_charts(views);
    let mut output = String::new();

    for (id, heading) in SECTIONS {
        output.push_str(&format!("{} {}\n\n", level, heading));

        if id == "anomalies" {
            output.push_str(&generate_anomaly_block(&views.anomalies, include_daily_series));
            continue;
        }

        if let Some(chart) = charts.iter().find(|c| c.id == id) {
            output.push_str(&format!("*{}*\n\n", chart.title));
            output.push_str(&render_chart_table(chart));
        }
    }

    output
}

/// Render the bar/line series of a chart as one Markdown table.
fn render_chart_table(chart: &Chart) -> String {
    let columns: Vec<_> = chart
        .series
        .iter()
        .filter(|s| s.kind != SeriesKind::Scatter)
        .collect();

    if chart.is_empty() || columns.is_empty() {
        return "No data in the selected range.\n\n".to_string();
    }

    let mut table = String::new();

    table.push_str(&format!("| {} |", chart.x_label));
    for series in &columns {
        table.push_str(&format!(" {} |", series.label));
    }
    table.push('\n');
    table.push_str("|:---|");
    table.push_str(&"---:|".repeat(columns.len()));
    table.push('\n');

    let lookups: Vec<HashMap<&str, f64>> = columns
        .iter()
        .map(|s| s.points.iter().map(|p| (p.x.as_str(), p.y)).collect())
        .collect();

    for point in &columns[0].points {
        table.push_str(&format!("| {} |", point.x));
        for lookup in &lookups {
            let cell = lookup
                .get(point.x.as_str())
                .map(|&y| format_value(y))
                .unwrap_or_default();
            table.push_str(&format!(" {} |", cell));
        }
        table.push('\n');
    }
    table.push('\n');

    table
}

/// Whole numbers without decimals, means with two.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Generate the anomaly metric, flagged days and optional daily series.
fn generate_anomaly_block(report: &AnomalyReport, include_daily_series: bool) -> String {
    let mut block = String::new();

    block.push_str("*Daily Change in Bike Rental Count with Anomalies*\n\n");
    block.push_str(&format!("**Detected Anomaly:** {}\n\n", report.anomaly_count()));

    if report.is_degenerate() {
        block.push_str(
            "> ⚠️ Fewer than two days in range; the threshold is 0 and no day is flagged.\n\n",
        );
    } else {
        block.push_str(&format!(
            "**Threshold:** ±{:.2} ({} × standard deviation of daily change)\n\n",
            report.threshold, report.sigma_multiplier
        ));
    }

    if report.anomalies.is_empty() {
        block.push_str("No anomalies detected.\n\n");
    } else {
        block.push_str("| Date | Total | Change |\n");
        block.push_str("|:---|---:|---:|\n");
        for day in &report.anomalies {
            block.push_str(&format!("| {} | {} | {:+} |\n", day.date, day.total, day.change));
        }
        block.push('\n');
    }

    if include_daily_series && !report.daily.is_empty() {
        block.push_str("<details>\n<summary>Daily Series</summary>\n\n");
        block.push_str("| Date | Total | Change | Anomaly |\n");
        block.push_str("|:---|---:|---:|:---:|\n");
        for day in &report.daily {
            block.push_str(&format!(
                "| {} | {} | {:+} | {} |\n",
                day.date,
                day.total,
                day.change,
                if day.is_anomaly { "🔴" } else { "" }
            ));
        }
        block.push_str("\n</details>\n\n");
    }

    block
}

/// Generate the date-filtered section, or the prompt when paused.
fn generate_interactive_section(tab: &InteractiveTab, include_daily_series: bool) -> String {
    let mut section = String::new();

    section.push_str("## Filtered View\n\n");

    match tab {
        InteractiveTab::Ready { range, views } => {
            section.push_str(&format!(
                "*Date range: {} ({} days, {} daily rows, {} hourly rows)*\n\n",
                range,
                range.days(),
                views.daily_rows,
                views.hourly_rows
            ));
            section.push_str(&generate_views_sections(views, "###", include_daily_series));
        }
        InteractiveTab::AwaitingInput { prompt } => {
            section.push_str(&format!("> ⚠️ {}\n\n", prompt));
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Dataset by Capital Bikeshare System, Washington D.C., USA*\n");

    footer
}

/// Chart specs grouped by dashboard part.
#[derive(Debug, Serialize)]
struct ChartSet {
    overview: Vec<Chart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filtered: Option<Vec<Chart>>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    dashboard: &'a Dashboard,
    charts: ChartSet,
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    let filtered = match &dashboard.interactive {
        InteractiveTab::Ready { views, .. } => Some(dashboard_charts(views)),
        InteractiveTab::AwaitingInput { .. } => None,
    };

    let report = JsonReport {
        dashboard,
        charts: ChartSet {
            overview: dashboard_charts(&dashboard.overview),
            filtered,
        },
    };

    serde_json::to_string_pretty(&report).map_err(Into::into)
}
