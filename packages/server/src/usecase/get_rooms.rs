//! UseCase: ルーム情報の取得（HTTP API 用）

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    Cursor, PresenceRepository, RoomId, RoomRepository, UserId, UserSummary,
};

use super::error::GetRoomError;

/// ルーム一覧の要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub member_count: usize,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

/// ルームの詳細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub id: RoomId,
    pub members: Vec<UserSummary>,
    pub content: String,
    pub message_count: usize,
    pub cursors: Vec<(UserId, Cursor)>,
    pub created_at: DateTime<Utc>,
}

/// ルーム情報取得のユースケース
pub struct GetRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRepository>,
}

impl GetRoomsUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, presence: Arc<dyn PresenceRepository>) -> Self {
        Self { rooms, presence }
    }

    /// ID 順のルーム一覧
    pub async fn list(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for room_id in self.rooms.room_ids().await {
            let Some(handle) = self.rooms.find(&room_id).await else {
                continue;
            };
            let room = handle.lock().await;
            summaries.push(RoomSummary {
                id: room.id.clone(),
                member_count: room.members.len(),
                message_count: room.messages.len(),
                created_at: room.created_at,
            });
        }
        summaries
    }

    pub async fn detail(&self, raw_room_id: String) -> Result<RoomDetail, GetRoomError> {
        let room_id = RoomId::new(raw_room_id.clone())
            .map_err(|_| GetRoomError::NotFound(raw_room_id.clone()))?;
        let handle = self
            .rooms
            .find(&room_id)
            .await
            .ok_or(GetRoomError::NotFound(raw_room_id))?;

        let room = handle.lock().await;
        let members = self.presence.summaries_of(&room.members).await;
        Ok(RoomDetail {
            id: room.id.clone(),
            members,
            content: room.content().to_string(),
            message_count: room.messages.len(),
            cursors: room
                .cursors
                .iter()
                .map(|(user_id, cursor)| (user_id.clone(), cursor.clone()))
                .collect(),
            created_at: room.created_at,
        })
    }
}
