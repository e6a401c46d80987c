//! Climate Quality Scorer
//!
//! Scores a temperature/humidity reading against the ideal ranges of a room
//! and maps the combined deviation to a comfort category.
//!
//! Two scoring modes exist. With a room profile, deviations from the room's
//! ideal ranges are combined with an occupancy density term. Without one (or
//! when the room data cannot be used) a basic assessment against fixed
//! default ranges is made. Each mode has its own threshold set.

use climate_types::{
    AssessmentDetails, ClimateAssessment, ClimateError, ClimateReading, ClimateStatus, Result,
    RoomPhysicalProfile,
};

use crate::compute_room_climate;

/// Default temperature range for the basic assessment, in °C
pub const BASIC_TEMP_RANGE_C: (f64, f64) = (20.0, 24.0);

/// Default humidity range for the basic assessment, in %
pub const BASIC_HUMIDITY_RANGE: (f64, f64) = (40.0, 60.0);

/// Humidity deviation is divided by this before being combined
pub const HUMIDITY_DIVISOR: f64 = 5.0;

/// Floor area per person considered comfortable, in m²
pub const COMFORTABLE_SPACE_PER_PERSON_M2: f64 = 4.0;

/// Upper bounds (exclusive) of combined deviation for each category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    pub excellent: f64,
    pub good: f64,
    pub moderate: f64,
    pub poor: f64,
}

impl ThresholdSet {
    pub fn classify(&self, combined_deviation: f64) -> ClimateStatus {
        if combined_deviation < self.excellent {
            ClimateStatus::Excellent
        } else if combined_deviation < self.good {
            ClimateStatus::Good
        } else if combined_deviation < self.moderate {
            ClimateStatus::Moderate
        } else if combined_deviation < self.poor {
            ClimateStatus::Poor
        } else {
            ClimateStatus::Bad
        }
    }
}

/// Thresholds used when the room profile is known
pub const ROOM_THRESHOLDS: ThresholdSet = ThresholdSet {
    excellent: 1.0,
    good: 2.5,
    moderate: 4.0,
    poor: 6.0,
};

/// Thresholds used for the basic assessment
pub const BASIC_THRESHOLDS: ThresholdSet = ThresholdSet {
    excellent: 0.5,
    good: 1.5,
    moderate: 3.0,
    poor: 5.0,
};

/// Distance from `value` to the nearest bound of `range`, 0 when inside
pub fn deviation_from_range(value: f64, (min, max): (f64, f64)) -> f64 {
    0f64.max(min - value).max(value - max)
}

fn humidity_deviation(humidity: f64, range: (f64, f64)) -> f64 {
    deviation_from_range(humidity, range) / HUMIDITY_DIVISOR
}

/// Combined deviation of the basic assessment
pub fn basic_deviation(reading: &ClimateReading) -> f64 {
    deviation_from_range(reading.temperature_c, BASIC_TEMP_RANGE_C)
        + humidity_deviation(reading.humidity_percent, BASIC_HUMIDITY_RANGE)
}

/// Score a reading against fixed default ranges
pub fn assess_basic(reading: &ClimateReading) -> ClimateAssessment {
    ClimateAssessment::new(BASIC_THRESHOLDS.classify(basic_deviation(reading)))
}

/// Score a reading against a room's ideal ranges and occupancy density
///
/// Fails when the room cannot be sized or the density term is not finite.
pub fn assess_with_room(
    reading: &ClimateReading,
    room: &RoomPhysicalProfile,
) -> Result<ClimateAssessment> {
    let climate = compute_room_climate(room)?;

    let temp_deviation =
        deviation_from_range(reading.temperature_c, climate.ideal_temperature_range_c);
    let humid_deviation =
        humidity_deviation(reading.humidity_percent, climate.ideal_humidity_range_percent);

    let space_per_person = room.area_square_meters / room.capacity_people;
    if !space_per_person.is_finite() {
        return Err(ClimateError::NonFinite("spacePerPerson"));
    }
    let space_deviation = 0f64.max((COMFORTABLE_SPACE_PER_PERSON_M2 - space_per_person) / 2.0);

    let combined = temp_deviation + humid_deviation + space_deviation;
    if !combined.is_finite() {
        return Err(ClimateError::NonFinite("combinedDeviation"));
    }

    let details = AssessmentDetails {
        room_volume: climate.volume_cubic_meters,
        required_airflow: climate.required_airflow_cfm.round(),
        co2_load: (climate.co2_load_cubic_meters_per_min * 1000.0).round() / 1000.0,
        ideal_temp_range: climate.ideal_temperature_range_c,
        ideal_humidity_range: climate.ideal_humidity_range_percent,
    };

    Ok(ClimateAssessment::new(ROOM_THRESHOLDS.classify(combined)).with_details(details))
}

/// Score a reading, using the room profile when one is available
///
/// Never fails: if the room data cannot be used the basic assessment is
/// returned instead.
pub fn assess_climate(
    reading: &ClimateReading,
    room: Option<&RoomPhysicalProfile>,
) -> ClimateAssessment {
    let Some(room) = room else {
        return assess_basic(reading);
    };

    match assess_with_room(reading, room) {
        Ok(assessment) => assessment,
        Err(e) => {
            tracing::debug!("Room assessment unavailable, using basic assessment: {}", e);
            assess_basic(reading)
        }
    }
}
