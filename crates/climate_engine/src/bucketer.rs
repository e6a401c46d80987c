//! Time Series Bucketer
//!
//! Builds chart buckets from raw readings when no pre-aggregated series is
//! available. Three tiers, tried in order:
//!
//! 1. real data: mean of the readings that fall in each bucket
//! 2. gap filling: an empty bucket continues the previous bucket's value
//!    with a small bounded random step
//! 3. synthetic trend: with fewer than [`MIN_CHART_BUCKETS`] buckets, a smooth
//!    24 hour sinusoid around the latest reading replaces the series

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use climate_types::{Period, TimeSeriesBucket, TimedReading};

use crate::aggregate::Accumulator;
use crate::{round_to, step_back};

/// Charts with fewer buckets than this fall back to the synthetic trend
pub const MIN_CHART_BUCKETS: usize = 7;

/// Largest temperature step applied when filling a gap, in °C
pub const GAP_FILL_TEMP_STEP: f64 = 0.2;

/// Largest humidity step applied when filling a gap, in %
pub const GAP_FILL_HUMIDITY_STEP: f64 = 0.4;

/// Amplitudes of the synthetic trend
pub const TREND_TEMP_AMPLITUDE: f64 = 1.5;
pub const TREND_HUMIDITY_AMPLITUDE: f64 = 5.0;

/// Hours between synthetic trend samples
pub const TREND_STEP_HOURS: i64 = 4;

const TREND_SPAN_HOURS: i64 = 24;
const TREND_LABEL_FORMAT: &str = "%H:%M";

/// Bucket `readings` for `period`, ending at `now`
pub fn bucket_readings(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<TimeSeriesBucket> {
    bucket_readings_with_rng(readings, period, now, &mut rand::thread_rng())
}

/// [`bucket_readings`] with a caller-supplied random source for gap filling
pub fn bucket_readings_with_rng<R: Rng + ?Sized>(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<TimeSeriesBucket> {
    let Some(latest) = readings.iter().max_by_key(|r| r.created_at) else {
        return Vec::new();
    };

    let mut buckets = fill_buckets(readings, period, now, rng);

    if buckets.len() < MIN_CHART_BUCKETS {
        tracing::debug!(
            "Only {} buckets for {:?}, synthesizing trend around latest reading",
            buckets.len(),
            period
        );
        buckets = synthetic_trend(latest, now);
    }

    buckets.sort_by_key(|b| b.timestamp);
    buckets
}

/// Bucket boundaries, earliest first; bucket `i` covers `(b[i], b[i + 1]]`
fn boundaries(period: Period, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let n = period.max_buckets() as u32;
    let width = period.bucket_width();
    (0..=n).map(|i| step_back(width, now, n - i)).collect()
}

fn fill_buckets<R: Rng + ?Sized>(
    readings: &[TimedReading],
    period: Period,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<TimeSeriesBucket> {
    let bounds = boundaries(period, now);
    let (first, last) = (bounds[0], bounds[bounds.len() - 1]);
    let mut slots = vec![Accumulator::default(); bounds.len() - 1];

    for reading in readings {
        let ts = reading.created_at;
        if ts <= first || ts > last {
            continue;
        }
        let idx = bounds.partition_point(|b| *b < ts) - 1;
        slots[idx].push(reading);
    }

    let mut buckets = Vec::with_capacity(slots.len());
    let mut previous: Option<(f64, f64)> = None;

    for (i, slot) in slots.iter().enumerate() {
        let value = match slot.mean() {
            Some((t, h)) => Some((round_to(t, 1), round_to(h, 1))),
            None if i > 0 => previous.map(|(t, h)| {
                let dt = rng.gen_range(-GAP_FILL_TEMP_STEP..=GAP_FILL_TEMP_STEP);
                let dh = rng.gen_range(-GAP_FILL_HUMIDITY_STEP..=GAP_FILL_HUMIDITY_STEP);
                (round_to(t + dt, 1), round_to(h + dh, 1))
            }),
            None => None,
        };

        let Some((temperature, humidity)) = value else {
            continue;
        };

        let start = bounds[i];
        buckets.push(TimeSeriesBucket {
            period_label: start.format(period.label_format()).to_string(),
            avg_temperature: temperature,
            avg_humidity: humidity,
            reading_count: slot.count,
            timestamp: start,
        });
        previous = Some((temperature, humidity));
    }

    buckets
}

/// Smooth 24 hour trend around a single reading, sampled every 4 hours
fn synthetic_trend(latest: &TimedReading, now: DateTime<Utc>) -> Vec<TimeSeriesBucket> {
    (0..=TREND_SPAN_HOURS / TREND_STEP_HOURS)
        .rev()
        .map(|step| {
            let hours_back = step * TREND_STEP_HOURS;
            let phase = (hours_back as f64 / 24.0) * 2.0 * PI;
            let timestamp = now - Duration::hours(hours_back);
            TimeSeriesBucket {
                period_label: timestamp.format(TREND_LABEL_FORMAT).to_string(),
                avg_temperature: round_to(latest.temperature + phase.sin() * TREND_TEMP_AMPLITUDE, 1),
                avg_humidity: round_to(latest.humidity + phase.cos() * TREND_HUMIDITY_AMPLITUDE, 1),
                reading_count: 0,
                timestamp,
            }
        })
        .collect()
}
