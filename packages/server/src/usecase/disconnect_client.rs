//! UseCase: クライアント切断処理
//!
//! 切断理由にかかわらず、入室中のルームから退出させ、Presence と送信キューを
//! 削除してからオンラインユーザー一覧を配信し直します。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PresenceRepository};

use super::{leave_room::LeaveRoomUseCase, roster::RosterBroadcaster};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    roster: RosterBroadcaster,
    leave_room: Arc<LeaveRoomUseCase>,
}

impl DisconnectClientUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        roster: RosterBroadcaster,
        leave_room: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
            roster,
            leave_room,
        }
    }

    /// 切断処理を実行
    pub async fn execute(&self, connection_id: ConnectionId) {
        if let Some(connection) = self.presence.get(&connection_id).await {
            if let Some(room_id) = connection.current_room.as_ref() {
                self.leave_room
                    .execute(&connection_id, &connection.identity.summary(), room_id)
                    .await;
            }
            tracing::info!("'{}' disconnected", connection.username());
        }

        self.presence.remove(&connection_id).await;
        self.message_pusher.unregister_client(&connection_id).await;
        self.roster.broadcast_online_users().await;
    }
}
