//! Room Climate Model
//!
//! Derives HVAC sizing parameters from a room's physical attributes.

use climate_types::{ClimateError, Result, RoomClimateProfile, RoomPhysicalProfile, RoomType};

/// Cubic feet per cubic meter
pub const CUBIC_FEET_PER_CUBIC_METER: f64 = 35.3147;

/// CO2 exhaled per occupant, in m³/min
pub const CO2_PER_PERSON_M3_PER_MIN: f64 = 0.005;

/// Ventilation and comfort targets for a room category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomSettings {
    /// Air changes per hour
    pub ach: f64,
    pub ideal_temp_c: (f64, f64),
    pub ideal_humidity: (f64, f64),
}

impl RoomSettings {
    const fn new(ach: f64, temp: (f64, f64)) -> Self {
        Self {
            ach,
            ideal_temp_c: temp,
            ideal_humidity: (40.0, 60.0),
        }
    }

    /// Lookup table entry for a room category
    pub fn for_type(room_type: &RoomType) -> Self {
        match room_type {
            RoomType::House => Self::new(8.0, (20.0, 22.0)),
            RoomType::Office | RoomType::Unrecognized(_) => Self::new(15.0, (20.0, 22.0)),
            RoomType::MeetingRoom => Self::new(15.0, (20.0, 22.0)),
            RoomType::Classroom => Self::new(12.0, (20.0, 24.0)),
            RoomType::Conference => Self::new(12.0, (20.0, 22.0)),
            RoomType::Hospital => Self::new(15.0, (20.0, 22.0)),
            RoomType::Lab => Self::new(20.0, (20.0, 22.0)),
            RoomType::Gym => Self::new(20.0, (18.0, 22.0)),
            RoomType::Restaurant => Self::new(20.0, (18.0, 22.0)),
            RoomType::Library => Self::new(12.0, (20.0, 22.0)),
            RoomType::CommonArea => Self::new(10.0, (20.0, 22.0)),
            RoomType::Other => Self::new(12.0, (20.0, 22.0)),
        }
    }
}

fn require_positive(value: f64, field: &'static str) -> Result<()> {
    if !value.is_finite() {
        return Err(ClimateError::NonFinite(field));
    }
    if value <= 0.0 {
        return Err(ClimateError::InvalidInput(format!(
            "{} must be greater than zero (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Check that a physical profile can be sized
pub fn validate_profile(profile: &RoomPhysicalProfile) -> Result<()> {
    require_positive(profile.area_square_meters, "areaSquareMeters")?;
    require_positive(profile.capacity_people, "capacityPeople")?;
    require_positive(profile.ceiling_height_meters, "ceilingHeightMeters")?;
    Ok(())
}

/// Compute the HVAC sizing of a room
///
/// Airflow is left unrounded; display code rounds it to whole CFM.
pub fn compute_room_climate(profile: &RoomPhysicalProfile) -> Result<RoomClimateProfile> {
    validate_profile(profile)?;

    let settings = RoomSettings::for_type(&profile.room_type);
    let volume = profile.area_square_meters * profile.ceiling_height_meters;
    let airflow = (volume * CUBIC_FEET_PER_CUBIC_METER * settings.ach) / 60.0;

    Ok(RoomClimateProfile {
        volume_cubic_meters: volume,
        required_airflow_cfm: airflow,
        co2_load_cubic_meters_per_min: profile.capacity_people * CO2_PER_PERSON_M3_PER_MIN,
        ideal_temperature_range_c: settings.ideal_temp_c,
        ideal_humidity_range_percent: settings.ideal_humidity,
        recommended_ach: settings.ach,
    })
}
