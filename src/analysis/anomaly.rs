//! Day-over-day anomaly detection.
//!
//! Rows are collapsed to one total per date, each day's change from the
//! previous day is computed, and a day is flagged when the absolute change
//! exceeds `sigma_multiplier` times the sample standard deviation of all
//! changes. The first day's change is 0 and takes part in the deviation.

use super::stats::sample_std_dev;
use crate::models::{AnomalyReport, DailyChange, RentalRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default multiple of the standard deviation used as the threshold.
pub const DEFAULT_SIGMA_MULTIPLIER: f64 = 2.0;

/// Sum `total` per date, chronologically.
pub fn daily_totals(records: &[RentalRecord]) -> Vec<(NaiveDate, u64)> {
    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for record in records {
        *totals.entry(record.date).or_default() += u64::from(record.total);
    }

    totals.into_iter().collect()
}

/// Signed change of each day from the previous one; the first entry is 0.
pub fn day_over_day_changes(totals: &[(NaiveDate, u64)]) -> Vec<i64> {
    if totals.is_empty() {
        return Vec::new();
    }

    std::iter::once(0)
        .chain(totals.windows(2).map(|w| w[1].1 as i64 - w[0].1 as i64))
        .collect()
}

/// Flag days whose absolute change exceeds the volatility threshold.
///
/// Input may be in any order and at any sub-daily grain. Dates with no rows
/// are absent from the output rather than interpolated.
pub fn detect_anomalies(records: &[RentalRecord], sigma_multiplier: f64) -> AnomalyReport {
    let totals = daily_totals(records);
    let changes = day_over_day_changes(&totals);

    let threshold = if totals.len() < 2 {
        warn!(
            "Only {} day(s) in range; anomaly threshold set to 0",
            totals.len()
        );
        0.0
    } else {
        let as_f64: Vec<f64> = changes.iter().map(|&c| c as f64).collect();
        sample_std_dev(&as_f64).unwrap_or(0.0) * sigma_multiplier
    };

    let daily: Vec<DailyChange> = totals
        .iter()
        .zip(&changes)
        .map(|(&(date, total), &change)| DailyChange {
            date,
            total,
            change,
            is_anomaly: (change.abs() as f64) > threshold,
        })
        .collect();

    let anomalies: Vec<DailyChange> = daily.iter().filter(|d| d.is_anomaly).cloned().collect();

    debug!(
        "Anomaly detection: {} days, threshold {:.2}, {} anomalies",
        daily.len(),
        threshold,
        anomalies.len()
    );

    AnomalyReport {
        daily,
        anomalies,
        threshold,
        sigma_multiplier,
    }
}
