//! Time Series Types
//!
//! Chart buckets and the granularity table that drives them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::TimedReading;

/// Chart granularity requested by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

/// Width of a single chart bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketWidth {
    Minute,
    Hour,
    Day,
    Month,
}

/// How far back a period looks from "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Months(u32),
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Minute,
        Period::Hour,
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
    ];

    pub fn bucket_width(&self) -> BucketWidth {
        match self {
            Period::Minute | Period::Hour => BucketWidth::Minute,
            Period::Day => BucketWidth::Hour,
            Period::Week | Period::Month => BucketWidth::Day,
            Period::Year => BucketWidth::Month,
        }
    }

    pub fn lookback(&self) -> Lookback {
        match self {
            Period::Minute => Lookback::Minutes(60),
            Period::Hour => Lookback::Hours(24),
            Period::Day => Lookback::Hours(24),
            Period::Week => Lookback::Days(7),
            Period::Month => Lookback::Days(31),
            Period::Year => Lookback::Months(12),
        }
    }

    /// Upper bound on the number of buckets in a chart
    pub fn max_buckets(&self) -> usize {
        match self {
            Period::Minute | Period::Hour => 60,
            Period::Day => 24,
            Period::Week => 7,
            Period::Month => 31,
            Period::Year => 12,
        }
    }

    /// chrono format string for bucket labels
    pub fn label_format(&self) -> &'static str {
        match self {
            Period::Minute | Period::Hour => "%H:%M",
            Period::Day => "%H:00",
            Period::Week => "%a %d",
            Period::Month => "%b %d",
            Period::Year => "%b %Y",
        }
    }
}

/// One aggregated interval of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesBucket {
    pub period_label: String,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub reading_count: u32,
    pub timestamp: DateTime<Utc>,
}

/// Summary figures over a period's lookback window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub reading_count: u32,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub latest: Option<TimedReading>,
}
