//! REST Handlers
//!
//! JSON endpoints for rooms, readings, assessments and chart statistics.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use climate_engine::{chart_series, compute_room_climate, overall_stats, window_start};
use climate_types::{ClimateError, Room, TimedReading};

use crate::store::StoreError;

use super::protocol::{
    CreateRoomRequest, ErrorBody, ErrorCode, ReadingRequest, RoomClimate, RoomDetails,
    StatsQuery, StatsResponse,
};
use super::state::AppState;

/// Error returned by the REST handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store failure: {}", e);
        ApiError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<ClimateError> for ApiError {
    fn from(e: ClimateError) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Room ids end up in store keys and URL paths
pub fn validate_room_id(id: &str) -> ApiResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!("Invalid room id: {:?}", id)))
    }
}

fn require_room(state: &AppState, id: &str) -> ApiResult<Room> {
    state
        .store()
        .get_room(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Room not found: {}", id)))
}

/// `GET /api/rooms`
pub async fn list_rooms(State(state): State<AppState>) -> ApiResult<Json<Vec<Room>>> {
    Ok(Json(state.store().list_rooms()?))
}

/// `POST /api/rooms`
pub async fn create_room(
    State(state): State<AppState>,
    request: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RoomDetails>)> {
    let Json(request) = request?;
    let id = request.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    validate_room_id(&id)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Room name is required".to_string()));
    }

    let climate = compute_room_climate(&request.profile)?;
    let room = Room {
        id,
        name: request.name,
        profile: request.profile,
    };

    state.store().put_room(&room)?;
    state.invalidate_climate(&room.id);
    tracing::info!("Saved room {} ({}, {})", room.name, room.id, room.profile.room_type);

    Ok((StatusCode::CREATED, Json(RoomDetails { room, climate })))
}

/// `GET /api/rooms/{id}`
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RoomDetails>> {
    let room = require_room(&state, &id)?;
    let climate = compute_room_climate(&room.profile)?;
    Ok(Json(RoomDetails { room, climate }))
}

/// `DELETE /api/rooms/{id}`
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.store().delete_room(&id)? {
        return Err(ApiError::NotFound(format!("Room not found: {}", id)));
    }
    state.invalidate_climate(&id);
    tracing::info!("Deleted room {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/rooms/{id}/readings`
pub async fn post_reading(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<ReadingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RoomClimate>)> {
    let Json(request) = request?;
    require_room(&state, &id)?;
    if !request.temperature.is_finite() || !request.humidity.is_finite() {
        return Err(ApiError::InvalidRequest(
            "Temperature and humidity must be finite numbers".to_string(),
        ));
    }

    let reading = TimedReading::new(
        request.temperature,
        request.humidity,
        request.created_at.unwrap_or_else(Utc::now),
    );
    let climate = state.record_reading(&id, reading).await?;
    Ok((StatusCode::CREATED, Json(climate)))
}

/// `GET /api/rooms/{id}/climate`
pub async fn get_climate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RoomClimate>> {
    state
        .room_climate(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No readings for room: {}", id)))
}

/// `GET /api/stats?roomId=..&period=..`
pub async fn get_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<Json<StatsResponse>> {
    let Query(query) = query?;
    require_room(&state, &query.room_id)?;

    let now = Utc::now();
    let store = state.store();
    let mut readings = store.readings(&query.room_id, window_start(query.period, now), now, None)?;

    // The chart falls back to a trend around the latest reading, even when
    // that reading is older than the window
    if readings.is_empty() {
        if let Some(latest) = store.latest_reading(&query.room_id)? {
            readings.push(latest);
        }
    }

    tracing::debug!(
        "Stats for room {} over {:?}: {} readings",
        query.room_id,
        query.period,
        readings.len()
    );

    Ok(Json(StatsResponse {
        time_series_data: chart_series(&readings, query.period, now),
        overall_stats: overall_stats(&readings, query.period, now),
    }))
}
