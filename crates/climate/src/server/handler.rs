//! WebSocket Connection Handler
//!
//! Handles individual WebSocket connections and message processing.

use std::ops::ControlFlow;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use climate_engine::compute_room_climate;

use super::protocol::{ClientMessage, ErrorCode, RoomDetails, ServerMessage};
use super::state::AppState;

/// Pushes queued per dashboard before new changes are dropped
const CLIENT_QUEUE_CAPACITY: usize = 64;

/// Handle a WebSocket connection
///
/// Outbound pushes and inbound requests run as two tasks; when either side
/// ends the other is aborted and the session's subscriptions are dropped.
pub async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CLIENT_QUEUE_CAPACITY);
    let session_id = state.register_client(tx).await;

    if let Ok(json) = serde_json::to_string(&ServerMessage::connected(session_id.to_string())) {
        if ws_sender.send(Message::Text(json)).await.is_err() {
            state.remove_client(session_id).await;
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&msg) else {
                continue;
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let inbound_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = ws_receiver.next().await {
            if handle_frame(&inbound_state, session_id, frame).await.is_break() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let dropped = state.get_subscriptions(session_id).await.len();
    state.remove_client(session_id).await;
    tracing::debug!("Session {} closed, dropped {} subscriptions", session_id, dropped);
}

/// Handle one inbound frame; `Break` ends the session
pub async fn handle_frame(state: &AppState, session_id: Uuid, frame: Message) -> ControlFlow<()> {
    match frame {
        Message::Text(text) => handle_client_message(state, session_id, &text).await,
        Message::Binary(_) => {
            send_error(
                state,
                session_id,
                None,
                ErrorCode::InvalidRequest,
                "Binary frames are not supported, send JSON text",
            )
            .await;
        }
        Message::Close(_) => return ControlFlow::Break(()),
        // Pongs are answered by axum
        Message::Ping(_) | Message::Pong(_) => {}
    }
    ControlFlow::Continue(())
}

/// Handle a client message
pub async fn handle_client_message(state: &AppState, session_id: Uuid, text: &str) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Failed to parse client message: {}", e);
            send_error(state, session_id, None, ErrorCode::InvalidRequest, "Invalid JSON").await;
            return;
        }
    };

    match msg {
        ClientMessage::Subscribe { id, paths } => {
            handle_subscribe(state, session_id, &id, paths).await;
        }
        ClientMessage::Unsubscribe { id, paths } => {
            state.unsubscribe(session_id, paths.clone()).await;
            let response =
                ServerMessage::success(id, Some(serde_json::json!({ "unsubscribed": paths })));
            state.send_to_client(session_id, response).await;
        }
        ClientMessage::Get { id, path } => {
            handle_get(state, session_id, &id, &path).await;
        }
        ClientMessage::Ping { id } => {
            state.send_to_client(session_id, ServerMessage::pong(id)).await;
        }
    }
}

/// Handle subscribe request
///
/// Replies with the current data of every concrete (wildcard free) path so
/// the dashboard can render before the first change arrives.
async fn handle_subscribe(state: &AppState, session_id: Uuid, id: &str, paths: Vec<String>) {
    state.subscribe(session_id, paths.clone()).await;

    let mut initial_data = serde_json::Map::new();
    for path in paths.iter().filter(|p| !p.contains('*')) {
        if let Ok(data) = resolve_path(state, path) {
            initial_data.insert(path.clone(), data);
        }
    }

    let response = ServerMessage::success(
        id,
        Some(serde_json::json!({
            "subscribed": paths,
            "data": initial_data
        })),
    );

    state.send_to_client(session_id, response).await;
}

/// Handle get request
async fn handle_get(state: &AppState, session_id: Uuid, id: &str, path: &str) {
    match resolve_path(state, path) {
        Ok(data) => {
            state
                .send_to_client(session_id, ServerMessage::success(id, Some(data)))
                .await;
        }
        Err((code, message)) => {
            send_error(state, session_id, Some(id), code, message).await;
        }
    }
}

/// Current data at a path
///
/// Supported paths: `/rooms`, `/rooms/{id}` and `/rooms/{id}/climate`.
pub fn resolve_path(state: &AppState, path: &str) -> Result<Value, (ErrorCode, String)> {
    let internal = |e: crate::store::StoreError| (ErrorCode::InternalError, e.to_string());
    let not_found = || (ErrorCode::NotFound, format!("Nothing at path: {}", path));

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["rooms"] => {
            let rooms = state.store().list_rooms().map_err(internal)?;
            Ok(serde_json::to_value(rooms).unwrap_or(Value::Null))
        }
        ["rooms", room_id] => {
            let room = state.store().get_room(room_id).map_err(internal)?.ok_or_else(not_found)?;
            let climate = compute_room_climate(&room.profile)
                .map_err(|e| (ErrorCode::InvalidRequest, e.to_string()))?;
            Ok(serde_json::to_value(RoomDetails { room, climate }).unwrap_or(Value::Null))
        }
        ["rooms", room_id, "climate"] => {
            let climate = state.room_climate(room_id).map_err(internal)?.ok_or_else(not_found)?;
            Ok(serde_json::to_value(climate).unwrap_or(Value::Null))
        }
        _ => Err((ErrorCode::InvalidPath, format!("Unknown path: {}", path))),
    }
}

/// Send an error message to a client
async fn send_error(
    state: &AppState,
    session_id: Uuid,
    id: Option<&str>,
    code: ErrorCode,
    message: impl Into<String>,
) {
    let msg = match id {
        Some(id) => ServerMessage::error_response(id, message),
        None => ServerMessage::Error {
            id: None,
            code,
            message: message.into(),
        },
    };
    state.send_to_client(session_id, msg).await;
}
