//! Grouped rental statistics.
//!
//! This module computes the summary tables shown on the dashboard: mean
//! rider counts by hour, by working-day flag and by season, and the
//! monthly total trend.

use crate::models::{
    GroupSummary, HourSummary, RentalRecord, SeasonSummary, TrendRow, WorkingDaySummary,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Running sums for one group.
#[derive(Debug, Default)]
struct MeasureSums {
    count: usize,
    casual: u64,
    registered: u64,
    total: u64,
}

impl MeasureSums {
    fn add(&mut self, record: &RentalRecord) {
        self.count += 1;
        self.casual += u64::from(record.casual);
        self.registered += u64::from(record.registered);
        self.total += u64::from(record.total);
    }

    fn into_summary<K>(self, key: K) -> GroupSummary<K> {
        let n = self.count as f64;
        GroupSummary {
            key,
            count: self.count,
            mean_casual: self.casual as f64 / n,
            mean_registered: self.registered as f64 / n,
            mean_total: self.total as f64 / n,
        }
    }
}

/// Group records by `key_fn` and average the measures of each group.
///
/// Output follows the natural ordering of the key.
fn mean_by<K, F>(records: &[RentalRecord], key_fn: F) -> Vec<GroupSummary<K>>
where
    K: Ord,
    F: Fn(&RentalRecord) -> K,
{
    let mut grouped: BTreeMap<K, MeasureSums> = BTreeMap::new();

    for record in records {
        grouped.entry(key_fn(record)).or_default().add(record);
    }

    grouped
        .into_iter()
        .map(|(key, sums)| sums.into_summary(key))
        .collect()
}

/// Mean casual/registered riders per hour of day, hour 0 first.
///
/// Rows without an hour (daily-grain rows) are skipped.
pub fn aggregate_by_hour(hourly: &[RentalRecord]) -> Vec<HourSummary> {
    let with_hour: Vec<(u8, &RentalRecord)> = hourly
        .iter()
        .filter_map(|r| r.hour.map(|h| (h, r)))
        .collect();

    if with_hour.len() < hourly.len() {
        debug!(
            "Skipped {} rows without an hour",
            hourly.len() - with_hour.len()
        );
    }

    let mut grouped: BTreeMap<u8, MeasureSums> = BTreeMap::new();
    for (hour, record) in with_hour {
        grouped.entry(hour).or_default().add(record);
    }

    grouped
        .into_iter()
        .map(|(hour, sums)| sums.into_summary(hour))
        .collect()
}

/// Mean riders on non-working days and on working days, in that order.
pub fn aggregate_by_working_day(daily: &[RentalRecord]) -> Vec<WorkingDaySummary> {
    mean_by(daily, |r| r.working_day)
}

/// Mean riders per season, spring first.
pub fn aggregate_by_season(daily: &[RentalRecord]) -> Vec<SeasonSummary> {
    mean_by(daily, |r| r.season)
}

/// Total rentals per calendar month, sorted chronologically.
pub fn aggregate_by_month(daily: &[RentalRecord]) -> Vec<TrendRow> {
    let mut grouped: HashMap<(i32, u32), (usize, u64)> = HashMap::new();

    for record in daily {
        let entry = grouped.entry((record.year, record.month)).or_default();
        entry.0 += 1;
        entry.1 += u64::from(record.total);
    }

    let mut trend: Vec<TrendRow> = grouped
        .into_iter()
        .filter_map(|((year, month), (count, total))| {
            match NaiveDate::from_ymd_opt(year, month, 1) {
                Some(date) => Some(TrendRow {
                    year,
                    month,
                    date,
                    count,
                    total,
                }),
                None => {
                    warn!("Dropping {} rows with invalid month {}-{}", count, year, month);
                    None
                }
            }
        })
        .collect();

    trend.sort_by_key(|row| row.date);

    trend
}

/// Sum of group sizes in a summary table.
pub fn grouped_row_count<K>(summary: &[GroupSummary<K>]) -> usize {
    summary.iter().map(|s| s.count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Season;
    use chrono::Datelike;

    fn create_test_record(
        date: NaiveDate,
        hour: Option<u8>,
        working_day: bool,
        season: Season,
        casual: u32,
        registered: u32,
    ) -> RentalRecord {
        RentalRecord {
            date,
            hour,
            working_day,
            season,
            year: date.year(),
            month: date.month(),
            casual,
            registered,
            total: casual + registered,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_sample() -> Vec<RentalRecord> {
        vec![
            create_test_record(date(2011, 1, 3), None, true, Season::Winter, 10, 50),
            create_test_record(date(2011, 1, 4), None, true, Season::Winter, 20, 70),
            create_test_record(date(2011, 1, 8), None, false, Season::Winter, 100, 20),
            create_test_record(date(2011, 4, 2), None, false, Season::Spring, 300, 900),
            create_test_record(date(2011, 7, 5), None, true, Season::Summer, 400, 1600),
            create_test_record(date(2011, 10, 6), None, true, Season::Fall, 250, 1250),
        ]
    }

    #[test]
    fn test_aggregate_by_working_day() {
        let rows = vec![
            create_test_record(date(2011, 1, 3), None, true, Season::Winter, 10, 50),
            create_test_record(date(2011, 1, 4), None, true, Season::Winter, 20, 70),
            create_test_record(date(2011, 1, 8), None, false, Season::Winter, 100, 20),
        ];

        let summary = aggregate_by_working_day(&rows);

        assert_eq!(summary.len(), 2);
        assert!(!summary[0].key);
        assert_eq!(summary[0].mean_casual, 100.0);
        assert_eq!(summary[0].mean_registered, 20.0);
        assert!(summary[1].key);
        assert_eq!(summary[1].mean_casual, 15.0);
        assert_eq!(summary[1].mean_registered, 60.0);
        assert_eq!(summary[1].mean_total, 75.0);
    }

    #[test]
    fn test_aggregate_by_season_natural_order() {
        let summary = aggregate_by_season(&daily_sample());

        let seasons: Vec<Season> = summary.iter().map(|s| s.key).collect();
        assert_eq!(
            seasons,
            vec![Season::Spring, Season::Summer, Season::Fall, Season::Winter]
        );

        let winter = &summary[3];
        assert_eq!(winter.count, 3);
        assert!((winter.mean_casual - 130.0 / 3.0).abs() < 1e-9);
        assert!((winter.mean_registered - 140.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_by_hour() {
        let day = date(2011, 1, 1);
        let mut rows = Vec::new();
        for hour in [17u8, 0, 8, 17, 0] {
            rows.push(create_test_record(day, Some(hour), false, Season::Winter, 2, u32::from(hour)));
        }

        let summary = aggregate_by_hour(&rows);

        let hours: Vec<u8> = summary.iter().map(|s| s.key).collect();
        assert_eq!(hours, vec![0, 8, 17]);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[2].mean_registered, 17.0);
        assert_eq!(summary[1].mean_casual, 2.0);
    }

    #[test]
    fn test_aggregate_by_hour_skips_rows_without_hour() {
        let rows = vec![
            create_test_record(date(2011, 1, 1), Some(3), true, Season::Winter, 1, 1),
            create_test_record(date(2011, 1, 1), None, true, Season::Winter, 1, 1),
        ];
        let summary = aggregate_by_hour(&rows);
        assert_eq!(grouped_row_count(&summary), 1);
    }

    #[test]
    fn test_group_sizes_cover_every_row() {
        let rows = daily_sample();

        assert_eq!(grouped_row_count(&aggregate_by_working_day(&rows)), rows.len());
        assert_eq!(grouped_row_count(&aggregate_by_season(&rows)), rows.len());

        let trend_rows: usize = aggregate_by_month(&rows).iter().map(|t| t.count).sum();
        assert_eq!(trend_rows, rows.len());
    }

    #[test]
    fn test_aggregate_by_month_sorted_for_any_order() {
        let mut rows = vec![
            create_test_record(date(2012, 2, 1), None, true, Season::Winter, 1, 9),
            create_test_record(date(2011, 12, 31), None, false, Season::Winter, 5, 5),
            create_test_record(date(2011, 1, 15), None, true, Season::Winter, 2, 3),
            create_test_record(date(2012, 2, 14), None, true, Season::Winter, 10, 10),
            create_test_record(date(2011, 12, 1), None, true, Season::Winter, 0, 1),
        ];

        let expected = aggregate_by_month(&rows);
        rows.reverse();
        let reversed = aggregate_by_month(&rows);

        assert_eq!(expected, reversed);
        let dates: Vec<NaiveDate> = expected.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date(2011, 1, 1), date(2011, 12, 1), date(2012, 2, 1)]
        );
        assert_eq!(expected[1].total, 11);
        assert_eq!(expected[2].total, 30);
        assert_eq!(expected[2].count, 2);
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        assert!(aggregate_by_hour(&[]).is_empty());
        assert!(aggregate_by_working_day(&[]).is_empty());
        assert!(aggregate_by_season(&[]).is_empty());
        assert!(aggregate_by_month(&[]).is_empty());
    }

    #[test]
    fn test_aggregations_are_idempotent() {
        let rows = daily_sample();
        assert_eq!(aggregate_by_season(&rows), aggregate_by_season(&rows));
        assert_eq!(aggregate_by_working_day(&rows), aggregate_by_working_day(&rows));
        assert_eq!(aggregate_by_month(&rows), aggregate_by_month(&rows));
    }
}
