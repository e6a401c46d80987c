//! API Protocol
//!
//! Message types exchanged with dashboards over WebSocket, and the JSON
//! bodies of the REST endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use chrono::{DateTime, Utc};
use climate_types::{
    ClimateAssessment, OverallStats, Period, Room, RoomClimateProfile, RoomPhysicalProfile,
    TimeSeriesBucket, TimedReading,
};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Subscribe to paths for real-time updates
    Subscribe {
        /// Request ID for correlation
        id: String,
        /// Paths to subscribe to (supports wildcards)
        paths: Vec<String>,
    },

    /// Unsubscribe from paths
    Unsubscribe { id: String, paths: Vec<String> },

    /// Get data at a path
    Get { id: String, path: String },

    /// Ping for keep-alive
    Ping { id: String },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent on initial connection
    Connected {
        session_id: String,
        server_version: String,
    },

    /// Response to a client request
    Response {
        id: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Push notification for subscribed paths
    Change {
        path: String,
        change_type: ChangeType,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },

    /// Error message
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        code: ErrorCode,
        message: String,
    },

    /// Pong response to ping
    Pong { id: String },
}

/// Type of change for push notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidPath,
    NotFound,
    InternalError,
}

impl ServerMessage {
    /// Create a success response
    pub fn success(id: impl Into<String>, data: Option<Value>) -> Self {
        Self::Response {
            id: id.into(),
            success: true,
            data,
            error: None,
        }
    }

    /// Create an error response
    pub fn error_response(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Response {
            id: id.into(),
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Create a change notification
    pub fn change(path: impl Into<String>, change_type: ChangeType, data: Option<Value>) -> Self {
        Self::Change {
            path: path.into(),
            change_type,
            data,
        }
    }

    /// Create a connected message
    pub fn connected(session_id: impl Into<String>) -> Self {
        Self::Connected {
            session_id: session_id.into(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Create a pong message
    pub fn pong(id: impl Into<String>) -> Self {
        Self::Pong { id: id.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// REST bodies
// ─────────────────────────────────────────────────────────────────────────────

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// `POST /api/rooms`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Generated when absent
    #[serde(default)]
    #[ts(optional)]
    pub id: Option<String>,
    pub name: String,
    pub profile: RoomPhysicalProfile,
}

/// A room together with its derived HVAC sizing
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetails {
    #[serde(flatten)]
    pub room: Room,
    pub climate: RoomClimateProfile,
}

/// `POST /api/rooms/{id}/readings`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRequest {
    pub temperature: f64,
    pub humidity: f64,
    /// Defaults to the time the reading is received
    #[serde(default)]
    #[ts(optional)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Latest reading of a room and its comfort assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomClimate {
    pub room_id: String,
    pub reading: TimedReading,
    pub assessment: ClimateAssessment,
}

/// Query of `GET /api/stats`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub room_id: String,
    #[serde(default)]
    pub period: Period,
}

/// `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub time_series_data: Vec<TimeSeriesBucket>,
    pub overall_stats: OverallStats,
}
