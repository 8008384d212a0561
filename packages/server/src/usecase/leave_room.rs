//! UseCase: ルーム退出処理
//!
//! 退出してもルームは削除されません。メンバーが 0 人になっても、ドキュメントと
//! メッセージ履歴は次の入室者に引き継がれます。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, FlushPolicy, MessagePusher, Notification, PresenceRepository,
    RoomId, RoomPersistence, RoomRepository, UserSummary,
};

use super::roster::RosterBroadcaster;

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    persistence: Arc<dyn RoomPersistence>,
    roster: RosterBroadcaster,
}

impl LeaveRoomUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        persistence: Arc<dyn RoomPersistence>,
        roster: RosterBroadcaster,
    ) -> Self {
        Self {
            rooms,
            presence,
            message_pusher,
            persistence,
            roster,
        }
    }

    /// 接続をルームから退出させる
    ///
    /// メンバーから外し、ユーザーのカーソルと入力中フラグを削除したうえで、
    /// 残りのメンバーに `user-left` とメンバー一覧を配信します。
    ///
    /// # Returns
    ///
    /// 実際に退出した場合は `true`（ルームが存在しない・入室していなければ `false`）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        user: &UserSummary,
        room_id: &RoomId,
    ) -> bool {
        let Some(handle) = self.rooms.find(room_id).await else {
            return false;
        };

        let (left, cursor_removed) = {
            let mut room = handle.lock().await;
            let left = room.remove_member(connection_id);
            let cursor_removed = room.remove_cursor(&user.user_id).is_some();
            room.stop_typing(&user.user_id);

            if left {
                let notification = Notification::UserLeft(user.clone());
                if let Err(e) = self
                    .message_pusher
                    .broadcast(&room.members, &notification)
                    .await
                {
                    tracing::warn!("Failed to broadcast user-left: {}", e);
                }
                self.roster.broadcast_room_users(&room).await;
            }
            (left, cursor_removed)
        };

        if let Err(e) = self.presence.set_current_room(connection_id, None).await {
            tracing::debug!("Presence already gone while leaving '{}': {}", room_id, e);
        }
        if left {
            tracing::info!("'{}' left room '{}'", user.username, room_id);
        }
        if left || cursor_removed {
            self.persistence.persist(FlushPolicy::Debounced).await;
        }
        left
    }
}
