//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::{
        conversion::cursor_to_dto,
        http::{RoomDetailDto, RoomSummaryDto},
        websocket::RoomUserDto,
    },
    ui::state::AppState,
    usecase::GetRoomError,
};
use tsudoi_shared::time::to_rfc3339_millis;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.list().await;

    // Domain Model から DTO への変換
    let room_summaries: Vec<RoomSummaryDto> = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.id.into_string(),
            member_count: room.member_count,
            message_count: room.message_count,
            created_at: to_rfc3339_millis(&room.created_at),
        })
        .collect();

    Json(room_summaries)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_rooms_usecase.detail(room_id).await {
        Ok(room) => {
            // Domain Model から DTO への変換
            let room_detail = RoomDetailDto {
                id: room.id.into_string(),
                members: room.members.iter().map(RoomUserDto::from).collect(),
                content: room.content,
                message_count: room.message_count,
                cursors: room
                    .cursors
                    .iter()
                    .map(|(user_id, cursor)| cursor_to_dto(user_id, cursor))
                    .collect(),
                created_at: to_rfc3339_millis(&room.created_at),
            };
            Ok(Json(room_detail))
        }
        Err(GetRoomError::NotFound(room_id)) => {
            tracing::debug!("Room '{}' not found", room_id);
            Err(StatusCode::NOT_FOUND)
        }
    }
}
