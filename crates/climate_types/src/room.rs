//! Room Types
//!
//! Physical description of a room and the HVAC sizing derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Ceiling height assumed when a room does not specify one
pub const DEFAULT_CEILING_HEIGHT_M: f64 = 2.5;

/// Room usage category
///
/// Any key that is not one of the known categories deserializes to
/// `Unrecognized`, which keeps the key as given and is sized like an office.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomType {
    House,
    Office,
    MeetingRoom,
    Classroom,
    Conference,
    Hospital,
    Lab,
    Gym,
    Restaurant,
    Library,
    CommonArea,
    Other,
    Unrecognized(String),
}

impl RoomType {
    /// All known categories, in lookup-table order
    pub const ALL: [RoomType; 12] = [
        RoomType::House,
        RoomType::Office,
        RoomType::MeetingRoom,
        RoomType::Classroom,
        RoomType::Conference,
        RoomType::Hospital,
        RoomType::Lab,
        RoomType::Gym,
        RoomType::Restaurant,
        RoomType::Library,
        RoomType::CommonArea,
        RoomType::Other,
    ];

    /// The key used by the rooms API
    pub fn key(&self) -> &str {
        match self {
            RoomType::House => "house",
            RoomType::Office => "office",
            RoomType::MeetingRoom => "meeting_room",
            RoomType::Classroom => "classroom",
            RoomType::Conference => "conference",
            RoomType::Hospital => "hospital",
            RoomType::Lab => "lab",
            RoomType::Gym => "gym",
            RoomType::Restaurant => "restaurant",
            RoomType::Library => "library",
            RoomType::CommonArea => "common_area",
            RoomType::Other => "other",
            RoomType::Unrecognized(key) => key,
        }
    }
}

impl From<&str> for RoomType {
    fn from(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .unwrap_or_else(|| RoomType::Unrecognized(key.to_string()))
    }
}

impl From<String> for RoomType {
    fn from(key: String) -> Self {
        RoomType::from(key.as_str())
    }
}

impl From<RoomType> for String {
    fn from(room_type: RoomType) -> Self {
        room_type.key().to_string()
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Physical attributes of a room, as entered in the rooms API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct RoomPhysicalProfile {
    pub area_square_meters: f64,
    pub capacity_people: f64,
    #[ts(type = "string")]
    pub room_type: RoomType,
    #[serde(default = "default_ceiling_height")]
    pub ceiling_height_meters: f64,
}

fn default_ceiling_height() -> f64 {
    DEFAULT_CEILING_HEIGHT_M
}

impl RoomPhysicalProfile {
    pub fn new(area_square_meters: f64, capacity_people: f64, room_type: RoomType) -> Self {
        Self {
            area_square_meters,
            capacity_people,
            room_type,
            ceiling_height_meters: DEFAULT_CEILING_HEIGHT_M,
        }
    }

    /// Set a non-default ceiling height
    pub fn with_ceiling_height(mut self, meters: f64) -> Self {
        self.ceiling_height_meters = meters;
        self
    }
}

/// HVAC sizing derived from a [`RoomPhysicalProfile`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct RoomClimateProfile {
    pub volume_cubic_meters: f64,
    pub required_airflow_cfm: f64,
    pub co2_load_cubic_meters_per_min: f64,
    pub ideal_temperature_range_c: (f64, f64),
    pub ideal_humidity_range_percent: (f64, f64),
    pub recommended_ach: f64,
}

/// A room record as stored by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub profile: RoomPhysicalProfile,
}
