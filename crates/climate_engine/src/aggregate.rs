//! Server-side aggregation
//!
//! Groups stored readings by truncated timestamp, the way the stats endpoint
//! pre-aggregates them, and computes summary statistics over a period.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use climate_types::{OverallStats, Period, TimeSeriesBucket, TimedReading};

use crate::{MIN_CHART_BUCKETS, bucket_readings, truncate, window_start};

/// Round `value` to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Running sums for one bucket
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    sum_temperature: f64,
    sum_humidity: f64,
    pub(crate) count: u32,
}

impl Accumulator {
    pub(crate) fn push(&mut self, reading: &TimedReading) {
        self.sum_temperature += reading.temperature;
        self.sum_humidity += reading.humidity;
        self.count += 1;
    }

    /// Mean temperature and humidity, `None` when empty
    pub(crate) fn mean(&self) -> Option<(f64, f64)> {
        if self.count == 0 {
            return None;
        }
        let n = f64::from(self.count);
        Some((self.sum_temperature / n, self.sum_humidity / n))
    }
}

/// Readings inside the period's lookback window ending at `now`
pub fn readings_in_window(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
) -> impl Iterator<Item = &TimedReading> {
    let start = window_start(period, now);
    readings
        .iter()
        .filter(move |r| r.created_at >= start && r.created_at <= now)
}

/// Group readings by truncated timestamp
///
/// Only buckets that hold readings are returned, oldest first, capped to the
/// most recent `period.max_buckets()` groups.
pub fn aggregate_readings(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<TimeSeriesBucket> {
    let width = period.bucket_width();
    let mut groups: BTreeMap<DateTime<Utc>, Accumulator> = BTreeMap::new();

    for reading in readings_in_window(readings, period, now) {
        groups
            .entry(truncate(width, reading.created_at))
            .or_default()
            .push(reading);
    }

    let skip = groups.len().saturating_sub(period.max_buckets());
    groups
        .into_iter()
        .skip(skip)
        .filter_map(|(timestamp, acc)| {
            let (temperature, humidity) = acc.mean()?;
            Some(TimeSeriesBucket {
                period_label: timestamp.format(period.label_format()).to_string(),
                avg_temperature: round_to(temperature, 1),
                avg_humidity: round_to(humidity, 1),
                reading_count: acc.count,
                timestamp,
            })
        })
        .collect()
}

/// Series for the dashboard chart
///
/// Uses the aggregated series when it is dense enough, otherwise the
/// client-side bucketer with its gap filling and trend fallback.
pub fn chart_series(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<TimeSeriesBucket> {
    let aggregated = aggregate_readings(readings, period, now);
    if aggregated.len() >= MIN_CHART_BUCKETS {
        return aggregated;
    }
    bucket_readings(readings, period, now)
}

fn extend(current: Option<f64>, value: f64, pick: fn(f64, f64) -> f64) -> Option<f64> {
    Some(current.map_or(value, |c| pick(c, value)))
}

/// Summary statistics over the period's lookback window
pub fn overall_stats(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
) -> OverallStats {
    let mut acc = Accumulator::default();
    let mut stats = OverallStats::default();

    for reading in readings_in_window(readings, period, now) {
        acc.push(reading);
        stats.min_temperature = extend(stats.min_temperature, reading.temperature, f64::min);
        stats.max_temperature = extend(stats.max_temperature, reading.temperature, f64::max);
        stats.min_humidity = extend(stats.min_humidity, reading.humidity, f64::min);
        stats.max_humidity = extend(stats.max_humidity, reading.humidity, f64::max);
        if stats.latest.is_none_or(|l| reading.created_at > l.created_at) {
            stats.latest = Some(*reading);
        }
    }

    stats.reading_count = acc.count;
    if let Some((temperature, humidity)) = acc.mean() {
        stats.avg_temperature = Some(round_to(temperature, 1));
        stats.avg_humidity = Some(round_to(humidity, 1));
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const EPS: f64 = 1e-9;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(21.25, 1), 21.3);
        assert_eq!(round_to(0.0204, 3), 0.02);
        assert_eq!(round_to(441.43, 0), 441.0);
    }

    #[test]
    fn test_groups_by_truncated_hour() {
        let readings = vec![
            TimedReading::new(20.0, 40.0, Utc.with_ymd_and_hms(2024, 6, 1, 10, 5, 0).unwrap()),
            TimedReading::new(22.0, 44.0, Utc.with_ymd_and_hms(2024, 6, 1, 10, 55, 0).unwrap()),
            TimedReading::new(23.0, 50.0, Utc.with_ymd_and_hms(2024, 6, 1, 12, 10, 0).unwrap()),
        ];

        let buckets = aggregate_readings(&readings, Period::Day, now());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].timestamp, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        assert_eq!(buckets[0].period_label, "10:00");
        assert_eq!(buckets[0].reading_count, 2);
        assert!((buckets[0].avg_temperature - 21.0).abs() < EPS);
        assert!((buckets[0].avg_humidity - 42.0).abs() < EPS);
        assert_eq!(buckets[1].reading_count, 1);
    }

    #[test]
    fn test_window_excludes_old_and_future() {
        let readings = vec![
            TimedReading::new(20.0, 40.0, now() - Duration::hours(30)),
            TimedReading::new(21.0, 41.0, now() - Duration::hours(1)),
            TimedReading::new(22.0, 42.0, now() + Duration::hours(1)),
        ];
        let buckets = aggregate_readings(&readings, Period::Day, now());
        assert_eq!(buckets.len(), 1);
        assert!((buckets[0].avg_temperature - 21.0).abs() < EPS);
    }

    #[test]
    fn test_caps_to_most_recent_buckets() {
        // one reading per minute for 3 hours, hour period keeps the last 60
        let readings: Vec<_> = (0..180)
            .map(|m| TimedReading::new(20.0, 50.0, now() - Duration::minutes(m)))
            .collect();
        let buckets = aggregate_readings(&readings, Period::Hour, now());
        assert_eq!(buckets.len(), 60);
        assert_eq!(buckets[59].timestamp, now());
        assert!(buckets.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_year_groups_by_month() {
        let readings: Vec<_> = (0..90)
            .map(|d| TimedReading::new(20.0, 50.0, now() - Duration::days(d)))
            .collect();
        let buckets = aggregate_readings(&readings, Period::Year, now());
        // June, May, April and the tail of March
        assert_eq!(buckets.len(), 4);
        assert!(buckets.iter().all(|b| b.timestamp.format("%d %H:%M").to_string() == "01 00:00"));
    }

    #[test]
    fn test_chart_series_prefers_dense_aggregate() {
        let readings: Vec<_> = (0..24)
            .map(|h| TimedReading::new(21.0, 50.0, now() - Duration::hours(h)))
            .collect();
        let series = chart_series(&readings, Period::Day, now());
        assert_eq!(series, aggregate_readings(&readings, Period::Day, now()));
        assert!(series.iter().all(|b| b.reading_count > 0));
    }

    #[test]
    fn test_chart_series_falls_back_when_sparse() {
        let readings = vec![TimedReading::new(21.0, 50.0, now() - Duration::minutes(5))];
        let series = chart_series(&readings, Period::Day, now());
        assert_eq!(series.len(), MIN_CHART_BUCKETS);
        assert!(series.iter().all(|b| b.reading_count == 0));
    }

    #[test]
    fn test_overall_stats() {
        let readings = vec![
            TimedReading::new(20.0, 40.0, now() - Duration::hours(3)),
            TimedReading::new(24.0, 60.0, now() - Duration::hours(1)),
            TimedReading::new(21.5, 45.0, now() - Duration::hours(2)),
            TimedReading::new(35.0, 90.0, now() - Duration::days(3)),
        ];
        let stats = overall_stats(&readings, Period::Day, now());

        assert_eq!(stats.reading_count, 3);
        assert_eq!(stats.avg_temperature, Some(21.8));
        assert_eq!(stats.avg_humidity, Some(48.3));
        assert_eq!(stats.min_temperature, Some(20.0));
        assert_eq!(stats.max_temperature, Some(24.0));
        assert_eq!(stats.min_humidity, Some(40.0));
        assert_eq!(stats.max_humidity, Some(60.0));
        assert_eq!(stats.latest.map(|l| l.temperature), Some(24.0));
    }

    #[test]
    fn test_overall_stats_empty() {
        let stats = overall_stats(&[], Period::Week, now());
        assert_eq!(stats, OverallStats::default());
    }
}
