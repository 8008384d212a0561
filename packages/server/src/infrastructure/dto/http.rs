//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{CursorDto, RoomUserDto};

/// `GET /api/rooms` の要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub member_count: usize,
    pub message_count: usize,
    pub created_at: String,
}

/// `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<RoomUserDto>,
    pub content: String,
    pub message_count: usize,
    pub cursors: Vec<CursorDto>,
    pub created_at: String,
}

/// `POST /api/upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponseDto {
    pub file_name: String,
    pub file_url: String,
    pub file_size: u64,
    pub file_type: String,
}
