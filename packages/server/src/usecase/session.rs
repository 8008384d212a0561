//! 接続のセッション状態の解決

use crate::domain::{
    Connection, ConnectionId, PresenceRepository, RoomHandle, RoomId, RoomRepository,
};

use super::error::SessionError;

/// 入室中の接続とそのルーム
pub(crate) struct JoinedRoom {
    pub connection: Connection,
    pub room_id: RoomId,
    pub handle: RoomHandle,
}

/// 接続の Presence レコードを取得する
pub(crate) async fn current_connection(
    presence: &dyn PresenceRepository,
    connection_id: &ConnectionId,
) -> Result<Connection, SessionError> {
    presence.get(connection_id).await.ok_or_else(|| {
        tracing::warn!("Session not found for connection '{}'", connection_id);
        SessionError::SessionMissing
    })
}

/// 接続が入室中のルームを取得する
pub(crate) async fn joined_room(
    presence: &dyn PresenceRepository,
    rooms: &dyn RoomRepository,
    connection_id: &ConnectionId,
) -> Result<JoinedRoom, SessionError> {
    let connection = current_connection(presence, connection_id).await?;
    let room_id = connection
        .current_room
        .clone()
        .ok_or(SessionError::NotInRoom)?;
    let handle = rooms.find(&room_id).await.ok_or_else(|| {
        tracing::warn!("Room '{}' not found for connection '{}'", room_id, connection_id);
        SessionError::RoomNotFound(room_id.to_string())
    })?;
    Ok(JoinedRoom {
        connection,
        room_id,
        handle,
    })
}
