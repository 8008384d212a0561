//! UseCase: ルーム入室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//!
//! ### どのような状況を想定しているか
//! - 正常系：入室者にスナップショット、他のメンバーに user-joined とメンバー一覧
//! - 正常系：存在しないルームは作成され、全接続にルーム一覧が配信される
//! - 正常系：別のルームに入室中なら先に退出する
//! - 異常系：セッションが存在しない

use std::sync::Arc;

use crate::domain::{
    ConnectionId, FlushPolicy, JOIN_HISTORY_LIMIT, MessagePusher, Notification,
    PresenceRepository, RoomId, RoomPersistence, RoomRepository, RoomSnapshot,
};

use super::{
    error::{JoinRoomError, SessionError},
    leave_room::LeaveRoomUseCase,
    roster::RosterBroadcaster,
    session::current_connection,
};

/// ルーム入室のユースケース
pub struct JoinRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    persistence: Arc<dyn RoomPersistence>,
    roster: RosterBroadcaster,
    leave_room: Arc<LeaveRoomUseCase>,
}

impl JoinRoomUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        persistence: Arc<dyn RoomPersistence>,
        roster: RosterBroadcaster,
        leave_room: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            rooms,
            presence,
            message_pusher,
            persistence,
            roster,
            leave_room,
        }
    }

    /// 入室処理を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 入室する接続
    /// * `raw_room_id` - クライアントが指定したルーム ID（未検証）
    ///
    /// # Returns
    ///
    /// 入室したルームの ID
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        raw_room_id: String,
    ) -> Result<RoomId, JoinRoomError> {
        let room_id = RoomId::new(raw_room_id).map_err(JoinRoomError::InvalidRoomId)?;
        let connection = current_connection(self.presence.as_ref(), &connection_id).await?;
        let user = connection.identity.summary();

        // 1. 別のルームに入室中なら退出
        if let Some(previous) = connection.current_room.as_ref()
            && previous != &room_id
        {
            self.leave_room
                .execute(&connection_id, &user, previous)
                .await;
        }

        // 2. ルームを取得（なければ作成して即時保存・ルーム一覧を配信）
        let (handle, created) = self.rooms.get_or_create(&room_id).await;
        if created {
            self.persistence.persist(FlushPolicy::Immediate).await;
            self.roster.broadcast_rooms_list().await;
        }

        self.presence
            .set_current_room(&connection_id, Some(room_id.clone()))
            .await
            .map_err(|_| SessionError::SessionMissing)?;

        // 3. スナップショットを入室者に送り、他のメンバーに通知
        let mut room = handle.lock().await;
        let added = room.add_member(connection_id);
        let snapshot = RoomSnapshot {
            room_id: room_id.clone(),
            content: room.content().to_string(),
            messages: room.recent_messages(JOIN_HISTORY_LIMIT),
            cursors: room
                .cursors
                .iter()
                .map(|(user_id, cursor)| (user_id.clone(), cursor.clone()))
                .collect(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &Notification::RoomJoined(snapshot))
            .await
        {
            tracing::warn!("Failed to send room snapshot to '{}': {}", connection_id, e);
        }

        if added {
            let others = room.members_except(&connection_id);
            if let Err(e) = self
                .message_pusher
                .broadcast(&others, &Notification::UserJoined(user.clone()))
                .await
            {
                tracing::warn!("Failed to broadcast user-joined: {}", e);
            }
            self.roster.broadcast_room_users(&room).await;
            tracing::info!("'{}' joined room '{}'", user.username, room_id);
        }

        Ok(room_id)
    }
}
