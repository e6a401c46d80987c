//! Reading Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A single temperature/humidity observation to be scored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ClimateReading {
    pub temperature_c: f64,
    pub humidity_percent: f64,
}

impl ClimateReading {
    pub fn new(temperature_c: f64, humidity_percent: f64) -> Self {
        Self {
            temperature_c,
            humidity_percent,
        }
    }
}

/// A raw stored sample reported by a room sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TimedReading {
    pub temperature: f64,
    pub humidity: f64,
    pub created_at: DateTime<Utc>,
}

impl TimedReading {
    pub fn new(temperature: f64, humidity: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            temperature,
            humidity,
            created_at,
        }
    }

    /// Drop the timestamp for scoring
    pub fn climate(&self) -> ClimateReading {
        ClimateReading::new(self.temperature, self.humidity)
    }
}
