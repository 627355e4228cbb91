//! Room Routes
//!
//! CRUD endpoints for chat rooms and their message history.
//!
//! - GET /api/rooms - List all rooms
//! - POST /api/rooms - Create a new room
//! - GET /api/rooms/:id - Get a specific room
//! - DELETE /api/rooms/:id - Delete a room (creator only)
//! - GET /api/rooms/:id/messages - Page through a room's history

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateRoomRequest, HistoryParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::store::{ChatMessage, Room};

/// GET /api/rooms
///
/// List all rooms, newest first, with live member counts filled in.
/// This endpoint is public so a room list can be shown before login.
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Room>>> {
    let mut rooms = state.store.list_rooms()?;
    for room in &mut rooms {
        room.member_count = Some(state.hub.room_member_count(&room.id).await);
    }

    Ok(Json(rooms))
}

/// POST /api/rooms
///
/// Create a new room owned by the authenticated user.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<(StatusCode, Json<Room>)> {
    if req.name.is_empty() {
        return Err(ApiError::Validation("Room name is required".to_string()));
    }

    let room = state.store.create_room(&req.name, &user.id)?;

    tracing::info!(room_id = %room.id, name = %room.name, created_by = %user.id, "Created room");

    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /api/rooms/:id
///
/// Get a specific room by ID.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Room>> {
    let mut room = state.store.get_room(&id)?;
    room.member_count = Some(state.hub.room_member_count(&room.id).await);

    Ok(Json(room))
}

/// DELETE /api/rooms/:id
///
/// Delete a room. Only the creator's delete takes effect; anyone else's
/// request is acknowledged without touching the room.
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_room(&id, &user.id)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/rooms/:id/messages
///
/// Page through a room's message history, oldest first. An unknown room
/// yields an empty page rather than an error.
pub async fn room_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    // The configured page size is also the ceiling for client requests.
    let limit = params
        .limit
        .unwrap_or(state.config.history_page_size)
        .min(state.config.history_page_size);
    let offset = params.offset.unwrap_or(0);

    let messages = state.store.messages_by_room(&id, limit, offset)?;

    Ok(Json(messages))
}
