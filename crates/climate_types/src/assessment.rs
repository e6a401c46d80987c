//! Assessment Types
//!
//! The comfort verdict shown on the dashboard badge.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Comfort category, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum ClimateStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
    Bad,
}

impl ClimateStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            ClimateStatus::Excellent => "😊",
            ClimateStatus::Good => "🙂",
            ClimateStatus::Moderate => "😐",
            ClimateStatus::Poor => "🙁",
            ClimateStatus::Bad => "😫",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ClimateStatus::Excellent => "Excellent Climate",
            ClimateStatus::Good => "Good Climate",
            ClimateStatus::Moderate => "Moderate Climate",
            ClimateStatus::Poor => "Poor Climate",
            ClimateStatus::Bad => "Bad Climate",
        }
    }

    /// Color token understood by the dashboard theme
    pub fn color(&self) -> &'static str {
        match self {
            ClimateStatus::Excellent => "green",
            ClimateStatus::Good => "light-green",
            ClimateStatus::Moderate => "yellow",
            ClimateStatus::Poor => "orange",
            ClimateStatus::Bad => "red",
        }
    }
}

/// Room-specific figures attached to an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetails {
    pub room_volume: f64,
    pub required_airflow: f64,
    pub co2_load: f64,
    pub ideal_temp_range: (f64, f64),
    pub ideal_humidity_range: (f64, f64),
}

/// Scored climate of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ClimateAssessment {
    pub status: ClimateStatus,
    pub emoji: String,
    pub message: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<AssessmentDetails>,
}

impl ClimateAssessment {
    /// Build an assessment with the presentation fields for `status`
    pub fn new(status: ClimateStatus) -> Self {
        Self {
            status,
            emoji: status.emoji().to_string(),
            message: status.message().to_string(),
            color: status.color().to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: AssessmentDetails) -> Self {
        self.details = Some(details);
        self
    }
}
